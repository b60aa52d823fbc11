//! Error types for the rendering core.
//!
//! Only construction is fallible. Stale-reference conditions (reports for
//! collected elements, unknown binding names, duplicate registrations) are
//! expected churn and are handled silently by the dispatch path, observable
//! at trace/debug level only.

/// A client payload could not be decoded into a property's value type.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// Errors surfaced by the rendering core.
#[derive(Debug, thiserror::Error)]
pub enum ElementError {
	/// The base markup fragment of an element was not exactly one element
	/// node. Raised at construction, never at render time.
	#[error("base fragment must be exactly one element")]
	MalformedFragment,

	/// A two-way binding received a client payload its codec cannot decode.
	/// Never propagates out of dispatch; reports carrying it are dropped.
	#[error("property '{property}' cannot decode client payload: {source}")]
	Codec {
		/// The property (attribute) name of the rejecting binding.
		property: String,
		/// What the codec objected to.
		source: DecodeError,
	},
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, ElementError>;
