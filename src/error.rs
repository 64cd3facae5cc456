use thiserror::Error;

macro_rules! invalid_state_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvalidState {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidState {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers the contract violations that can occur while tracking an object graph:
/// mutating objects in states that forbid mutation, addressing properties that do not exist
/// on the tracked type, and handing the engine shapes it cannot represent. Every variant is
/// locally fatal to the triggering call - no partial mutation is committed - but never corrupts
/// previously-tracked state.
///
/// # Error Categories
///
/// ## Contract Violations
/// - [`Error::InvalidState`] - Mutation of a deleted object, or tracking a type that opted out
/// - [`Error::UnknownProperty`] - Property lookup by a name not present on the tracked type
/// - [`Error::NotSupported`] - A shape the engine cannot represent (e.g. a non-collection value
///   behind a collection-typed property)
///
/// ## Synchronization
/// - [`Error::LockError`] - A shared lock was poisoned by a panicking writer
///
/// # Examples
///
/// ```rust,ignore
/// use graphtrack::{track, Error};
///
/// match wrapper.set("Customer", "Test1") {
///     Ok(()) => println!("recorded"),
///     Err(Error::InvalidState { message, file, line }) => {
///         eprintln!("invalid state: {} ({}:{})", message, file, line);
///     }
///     Err(Error::UnknownProperty { property, type_name }) => {
///         eprintln!("no property '{}' on '{}'", property, type_name);
///     }
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An operation was attempted in a state that forbids it.
    ///
    /// Raised when mutating a property of an object whose status is `Deleted`, when an
    /// index-based collection operation addresses a position outside the live sequence,
    /// or when tracking is requested for a type that is marked as excluded from tracking.
    /// The error includes the source location where the violation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the violated state contract
    /// * `file` - Source file in which the error was detected
    /// * `line` - Source line in which the error was detected
    #[error("Invalid state - {file}:{line}: {message}")]
    InvalidState {
        /// The message to be printed for the `InvalidState` error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A property name was used that does not exist on the tracked type.
    ///
    /// Original-value lookups and property writes validate the property name against the
    /// tracked type's descriptor table before touching any state. A name that is absent
    /// from the table is a programmer error, not a retryable condition.
    #[error("Unknown property '{property}' on tracked type '{type_name}'")]
    UnknownProperty {
        /// The property name that failed to resolve
        property: String,
        /// The name of the tracked type that was queried
        type_name: String,
    },

    /// The engine was asked to track a shape it cannot represent.
    ///
    /// Occurs when a collection-typed property holds a value that is not a collection of
    /// trackable objects (e.g. a bare scalar sequence, which has no per-element identity
    /// the engine could diff against).
    #[error("Not supported - {0}")]
    NotSupported(String),

    /// Failed to lock target.
    ///
    /// This error occurs when thread synchronization fails, typically when trying to
    /// acquire a mutex or rwlock that was poisoned by a panicking writer.
    #[error("Failed to lock target")]
    LockError,
}

/// Specialized `Result` type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
