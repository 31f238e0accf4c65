//! Pipeline orchestration: façade → analyzer → collector → artifacts.

use std::path::Path;

use crate::aedoc;
use crate::analyzer;
use crate::collector::Collector;
use crate::config::ExtractorConfig;
use crate::facade::Program;
use crate::messages::{ExtractorMessage, MessageCollector};
use crate::metadata;
use crate::model;
use crate::review;

/// Runs the full extraction for one package.
pub struct Extractor {
    config: ExtractorConfig,
    local_build: bool,
    dump_graph: bool,
}

/// Artifacts plus diagnostics from one run.
pub struct ExtractionResult {
    pub package_name: String,
    pub review_text: String,
    pub model_json: String,
    /// Messages sorted by (file, line, col).
    pub messages: Vec<ExtractorMessage>,
    pub error_count: usize,
    pub warning_count: usize,
    pub graph_dump: Option<String>,
}

impl ExtractionResult {
    /// Whether the run succeeds: errors always fail; warnings fail unless
    /// this was a local build.
    pub fn succeeded(&self, local_build: bool) -> bool {
        self.error_count == 0 && (local_build || self.warning_count == 0)
    }
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            local_build: false,
            dump_graph: false,
        }
    }

    /// Local builds keep warnings non-fatal.
    pub fn local_build(mut self, local: bool) -> Self {
        self.local_build = local;
        self
    }

    /// Also produce the deterministic graph dump.
    pub fn dump_graph(mut self, dump: bool) -> Self {
        self.dump_graph = dump;
        self
    }

    pub fn is_local_build(&self) -> bool {
        self.local_build
    }

    /// Run the extraction. Artifacts are produced even when semantic
    /// warnings are present; only input errors abort.
    pub fn run(&self, entry: &Path) -> anyhow::Result<ExtractionResult> {
        aedoc::init();

        let package_name = self.package_name(entry);

        let (program, load_messages) = Program::load(entry)?;
        let analyzed = analyzer::analyze(&program);
        let mut collector = Collector::new(&program, analyzed);

        metadata::check_semantics(&mut collector, &self.config.allowed_tags());

        let review_text = review::generate_review_file(&mut collector);
        let model_document = model::build_api_model(&mut collector, &package_name);
        let mut model_json = serde_json::to_string_pretty(&model_document)?;
        model_json.push('\n');

        let graph_dump = self.dump_graph.then(|| collector.graph.dump(&program));

        let mut messages = MessageCollector::new();
        messages.extend(load_messages);
        messages.extend(std::mem::take(&mut collector.messages));

        Ok(ExtractionResult {
            package_name,
            review_text,
            model_json,
            error_count: messages.error_count(),
            warning_count: messages.warning_count(),
            messages: messages.sorted(),
            graph_dump,
        })
    }

    fn package_name(&self, entry: &Path) -> String {
        if let Some(name) = &self.config.package_name {
            return name.clone();
        }
        entry
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "package".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn run_extractor(source: &str) -> ExtractionResult {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("index.ts");
        fs::write(&entry, source).unwrap();
        Extractor::new(ExtractorConfig::default())
            .run(&entry)
            .unwrap()
    }

    #[test]
    fn test_artifacts_produced_with_warnings() {
        let result = run_extractor("export class Untagged {}\n");
        assert!(result.warning_count > 0);
        assert!(result.review_text.contains("class Untagged"));
        assert!(result.model_json.contains("\"Untagged\""));
        assert!(!result.succeeded(false));
        assert!(result.succeeded(true));
    }

    #[test]
    fn test_clean_extraction_succeeds() {
        let result = run_extractor(
            "/**\n * The lib.\n * @packageDocumentation\n */\n\n/** Widget. @public */\nexport class Widget {\n}\n",
        );
        assert_eq!(result.error_count, 0);
        assert_eq!(result.warning_count, 0);
        assert!(result.succeeded(false));
    }

    #[test]
    fn test_determinism() {
        let source = concat!(
            "interface IHidden { x: number; }\n",
            "/** C. @public */\nexport class C {\n  method(): IHidden;\n}\n",
        );
        let first = run_extractor(source);
        let second = run_extractor(source);
        assert_eq!(first.review_text, second.review_text);
        assert_eq!(first.model_json, second.model_json);
    }

    #[test]
    fn test_missing_entry_point_is_error() {
        let temp = TempDir::new().unwrap();
        let result = Extractor::new(ExtractorConfig::default()).run(&temp.path().join("nope.ts"));
        assert!(result.is_err());
    }

    #[test]
    fn test_graph_dump_is_deterministic() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("index.ts");
        fs::write(&entry, "/** A. @public */\nexport class A {\n  go(): void;\n}\n").unwrap();

        let extractor = Extractor::new(ExtractorConfig::default()).dump_graph(true);
        let first = extractor.run(&entry).unwrap().graph_dump.unwrap();
        let second = extractor.run(&entry).unwrap().graph_dump.unwrap();
        assert_eq!(first, second);
        assert!(first.contains("AstSymbol: A"));
        assert!(first.contains("AstDeclaration: class_declaration"));
    }
}
