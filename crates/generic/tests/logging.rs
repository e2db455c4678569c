pub mod fixtures;

use fixtures::*;
use gschema_engine::Field;
use gschema_generic::GenericSchema;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn captured<F: FnOnce()>(f: F) -> String {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::WARN)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    capture.contents()
}

#[test]
fn test_setting_many_warns() {
    let logs = captured(|| {
        let mut schema = foo_schema();
        schema.set_many(true);
    });
    assert!(logs.contains("WARN"), "Expected a warning, got: {logs}");
    assert!(logs.contains("many"));
}

#[test]
fn test_field_mismatch_warns_at_definition() {
    let logs = captured(|| {
        let _schema = GenericSchema::<Foo>::define("PartialFooSchema")
            .field("field1", Field::integer())
            .field("other", Field::string())
            .build()
            .expect("Mismatch is only diagnosed, not rejected");
    });
    assert!(logs.contains("do not match"), "Expected a mismatch warning, got: {logs}");
    assert!(logs.contains("field2"));
    assert!(logs.contains("other"));
}

#[test]
fn test_matching_definition_is_silent() {
    let logs = captured(|| {
        let _schema = foo_schema();
    });
    assert!(logs.is_empty(), "Unexpected output: {logs}");
}
