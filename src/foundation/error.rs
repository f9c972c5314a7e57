pub type SceneResult<T> = Result<T, SceneError>;

/// Errors raised by the scene core.
///
/// The first four variants are the structural failures callers are expected to
/// surface back to the agent loop; none of them is retried inside the core.
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// A display or namespace token cannot be mapped to a value.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// An operation targets an entity not owned by the image it runs on.
    #[error("ownership error: {0}")]
    Ownership(String),

    /// Parallel list parameters have different lengths.
    #[error("parameter shape error: {0}")]
    ParameterShape(String),

    /// Empty mask, zero-area box or empty operand list where one is required.
    #[error("degenerate geometry error: {0}")]
    DegenerateGeometry(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("raster error: {0}")]
    Raster(String),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SceneError {
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    pub fn ownership(msg: impl Into<String>) -> Self {
        Self::Ownership(msg.into())
    }

    pub fn parameter_shape(msg: impl Into<String>) -> Self {
        Self::ParameterShape(msg.into())
    }

    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateGeometry(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

/// Reject parallel list parameters whose lengths differ.
///
/// `lists` pairs a parameter name with its length; the first entry is the
/// reference length.
pub fn ensure_same_len(lists: &[(&str, usize)]) -> SceneResult<()> {
    let Some(&(first_name, first_len)) = lists.first() else {
        return Ok(());
    };
    for &(name, len) in &lists[1..] {
        if len != first_len {
            return Err(SceneError::parameter_shape(format!(
                "'{first_name}' has {first_len} items but '{name}' has {len}"
            )));
        }
    }
    Ok(())
}

/// Reject an empty operand list.
pub fn ensure_non_empty(name: &str, len: usize) -> SceneResult<()> {
    if len == 0 {
        return Err(SceneError::degenerate(format!(
            "'{name}' must contain at least one item"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            SceneError::resolution("x")
                .to_string()
                .contains("resolution error:")
        );
        assert!(
            SceneError::ownership("x")
                .to_string()
                .contains("ownership error:")
        );
        assert!(
            SceneError::parameter_shape("x")
                .to_string()
                .contains("parameter shape error:")
        );
        assert!(
            SceneError::degenerate("x")
                .to_string()
                .contains("degenerate geometry error:")
        );
        assert!(
            SceneError::validation("x")
                .to_string()
                .contains("validation error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = SceneError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn same_len_reports_offending_parameter() {
        ensure_same_len(&[("entities", 2), ("angles", 2), ("units", 2)]).unwrap();
        let err = ensure_same_len(&[("entities", 2), ("angles", 1)]).unwrap_err();
        assert!(matches!(err, SceneError::ParameterShape(_)));
        assert!(err.to_string().contains("angles"));
    }

    #[test]
    fn empty_operand_list_is_degenerate() {
        assert!(matches!(
            ensure_non_empty("entities", 0),
            Err(SceneError::DegenerateGeometry(_))
        ));
        ensure_non_empty("entities", 1).unwrap();
    }
}
