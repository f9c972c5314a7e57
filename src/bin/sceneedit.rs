use std::{
    collections::HashSet,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

use sceneedit::{EditSettings, Entity, EntityId, ImageEntity, Message, Namespace};

#[derive(Parser, Debug)]
#[command(name = "sceneedit", version)]
struct Cli {
    /// Edit settings JSON (defaults apply to missing fields).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the entity tree of an image.
    Inspect(InspectArgs),
    /// Decode the base raster (with its filters) to a PNG.
    Render(RenderArgs),
    /// Write the dilated composite mask of some objects as a PNG.
    Mask(MaskArgs),
    /// Convert a display-form message to namespace form.
    Contextualize(CodecArgs),
    /// Convert a namespace-form message to display form.
    Decontextualize(CodecArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input image JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input image JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Skip the base layer's filter list.
    #[arg(long)]
    no_filters: bool,
}

#[derive(Parser, Debug)]
struct MaskArgs {
    /// Input image JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Object ids to merge; all object children when omitted.
    #[arg(long = "object", value_name = "ID")]
    objects: Vec<String>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CodecArgs {
    /// Message JSON.
    #[arg(long)]
    message: PathBuf,

    /// Namespace JSON; an empty namespace is used when the file does not exist.
    #[arg(long)]
    namespace: PathBuf,

    /// Output path for `{ message, namespace }`; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct CodecOutput<'a> {
    message: &'a Message,
    namespace: &'a Namespace,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => EditSettings::from_json_path(path)?,
        None => EditSettings::default(),
    };
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Render(args) => cmd_render(args),
        Command::Mask(args) => cmd_mask(args, &settings),
        Command::Contextualize(args) => cmd_codec(args, sceneedit::contextualize),
        Command::Decontextualize(args) => cmd_codec(args, sceneedit::decontextualize),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parse {what} JSON"))
}

fn read_image(path: &Path) -> anyhow::Result<ImageEntity> {
    match read_json::<Entity>(path, "image")? {
        Entity::Image(img) => Ok(img),
        other => anyhow::bail!(
            "'{}' holds a {} entity, expected an image",
            path.display(),
            other.kind().slug()
        ),
    }
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn print_tree(entity: &Entity, depth: usize) {
    let p = entity.props();
    let mut line = format!(
        "{:indent$}{} {} at ({}, {}) size {}x{}",
        "",
        entity.kind().slug(),
        p.id,
        p.left,
        p.top,
        p.width,
        p.height,
        indent = depth * 2
    );
    if let Some(name) = &p.name {
        line.push_str(&format!(" name={name}"));
    }
    if let Entity::Object(obj) = entity {
        match &obj.image_id {
            Some(owner) => line.push_str(&format!(" owner={owner} inpainted={}", obj.inpainted)),
            None => line.push_str(&format!(" filters={}", obj.filters.len())),
        }
    }
    if p.ephemeral {
        line.push_str(" ephemeral");
    }
    println!("{line}");
    if let Entity::Image(img) = entity {
        for child in &img.objects {
            print_tree(child, depth + 1);
        }
    }
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let img = read_image(&args.in_path)?;
    let size = img.size()?;
    println!("raster {}x{}", size.width, size.height);
    print_tree(&Entity::Image(img), 0);
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let img = read_image(&args.in_path)?;
    let raster = img.raster(!args.no_filters)?;
    create_parent(&args.out)?;
    raster
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_mask(args: MaskArgs, settings: &EditSettings) -> anyhow::Result<()> {
    let img = read_image(&args.in_path)?;
    let wanted: HashSet<EntityId> = args.objects.iter().map(|s| EntityId::from(s.as_str())).collect();
    let objects: Vec<_> = img
        .objects()
        .iter()
        .filter_map(Entity::as_object)
        .filter(|o| wanted.is_empty() || wanted.contains(&o.props.id))
        .collect();
    let composite = sceneedit::mask::composite_mask(&img, &objects)?;
    let expanded = sceneedit::mask::dilate(&composite, settings.mask_threshold, settings.mask_dilation_px);
    create_parent(&args.out)?;
    expanded
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {} ({} objects)", args.out.display(), objects.len());
    Ok(())
}

fn cmd_codec(
    args: CodecArgs,
    transform: fn(&Message, &mut Namespace) -> sceneedit::SceneResult<Message>,
) -> anyhow::Result<()> {
    let message: Message = read_json(&args.message, "message")?;
    let mut namespace: Namespace = if args.namespace.exists() {
        read_json(&args.namespace, "namespace")?
    } else {
        Namespace::new()
    };

    let out = transform(&message, &mut namespace)?;
    let body = serde_json::to_string_pretty(&CodecOutput {
        message: &out,
        namespace: &namespace,
    })?;
    match &args.out {
        Some(path) => {
            create_parent(path)?;
            std::fs::write(path, body).with_context(|| format!("write '{}'", path.display()))?;
        }
        None => println!("{body}"),
    }
    Ok(())
}
