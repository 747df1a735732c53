use tag_searcher::model::types::EntityRef;
use tag_searcher::searchable::Searchable;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }
}

struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Minimal searchable entity for tests.
#[allow(dead_code)]
pub struct TestEntity {
    pub entity_type: &'static str,
    pub id: i64,
    pub tags: Vec<String>,
    pub search_type: Option<&'static str>,
}

#[allow(dead_code)]
impl TestEntity {
    pub fn new(entity_type: &'static str, id: i64, tags: &[&str]) -> Self {
        Self {
            entity_type,
            id,
            tags: tags.iter().map(|s| s.to_string()).collect(),
            search_type: None,
        }
    }

    pub fn with_search_type(mut self, label: &'static str) -> Self {
        self.search_type = Some(label);
        self
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_type, self.id)
    }
}

impl Searchable for TestEntity {
    fn entity_type(&self) -> &str {
        self.entity_type
    }

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn attributes_for_tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    fn search_type(&self) -> String {
        self.search_type
            .map(str::to_owned)
            .unwrap_or_else(|| self.entity_type.to_owned())
    }

    fn map_for_search(&self) -> serde_json::Value {
        serde_json::json!({ "id": self.id })
    }
}
