use gschema_derive::schema_error;
use std::borrow::Cow;

#[schema_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Slot {index} is out of range")]
    OutOfRange { index: usize },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let err = DemoError::OutOfRange { index: 7 };
    assert_eq!(err.kind(), "OutOfRange");
}
