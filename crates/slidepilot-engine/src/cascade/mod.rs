pub mod descriptor;
pub mod resolver;

pub use descriptor::{Cascade, Descriptor, Matcher, normalize_text};
pub use resolver::{ResolvedElement, count, matches, resolve, resolve_any};
