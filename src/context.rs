//! Translation between chat text and the execution namespace.
//!
//! In display form, messages name entities with reference markup
//! (`#<color>[<label>](<uuid>)`) and carry attachments by value. In namespace
//! form, messages use `@<name>` tokens bound in a [`Namespace`]. The two
//! transforms are inverse for a fixed namespace, and each is a no-op on a
//! message already in its target form.

mod codec;
mod markup;
mod message;
mod namespace;

pub use codec::{contextualize, decontextualize};
pub use markup::{DisplayToken, NamespaceToken, display_tokens, namespace_tokens};
pub use message::Message;
pub use namespace::{Namespace, Value};
