//! OpenAPI document generation for the notes routes.

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use common::{notes_api, test_settings, NoteStore};
use restx_api::config::ApiSettings;
use restx_core::docs::Documentation;
use serde_json::{json, Value};

const DOCS: &str = r#"
notes.views.NoteListView:
  GET:
    operationId: notes_index
    summary: List notes
    description: Every note, newest first.
    x-code-samples:
      - lang: Shell
        label: cURL
        source: curl https://api.example.com/notes/
  POST:
    summary: Create a note
    x-badges:
      - Beta
notes.views.NoteDetailView:
  DELETE:
    deprecated: true
"#;

fn document(docs: &Documentation) -> Value {
    let store = NoteStore::default();
    let openapi = notes_api(&store).openapi_with_docs(&test_settings(), docs);
    serde_json::to_value(&openapi).unwrap()
}

fn response_ref(doc: &Value, path: &str, method: &str, status: &str) -> Value {
    doc["paths"][path][method]["responses"][status]["content"]["application/json"]["schema"]
        ["$ref"]
        .clone()
}

fn component(doc: &Value, name: &str) -> Value {
    doc["components"]["schemas"][name].clone()
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[test]
fn object_responses_are_enveloped() {
    let doc = document(&Documentation::default());

    assert_eq!(
        response_ref(&doc, "/notes/{id}/", "get", "200"),
        "#/components/schemas/NoteOutResponse"
    );
    assert_eq!(
        response_ref(&doc, "/notes/", "post", "201"),
        "#/components/schemas/NoteOutResponse"
    );

    let envelope = component(&doc, "NoteOutResponse");
    assert_eq!(envelope["properties"]["data"]["$ref"], "#/components/schemas/NoteOut");
    assert_eq!(envelope["properties"]["status"]["examples"], json!(["success"]));
    assert!(component(&doc, "NoteOut")["properties"]["url"].is_object());
}

#[test]
fn paginated_lists_get_a_named_page_schema() {
    let doc = document(&Documentation::default());

    assert_eq!(
        response_ref(&doc, "/notes/", "get", "200"),
        "#/components/schemas/PaginatedNoteOutListResponse"
    );
    let page = component(&doc, "PaginatedNoteOutList");
    assert!(page["properties"]["count"].is_object());
    assert_eq!(
        page["properties"]["results"]["items"]["$ref"],
        "#/components/schemas/NoteOut"
    );
}

#[test]
fn unpaginated_list_envelopes_an_array() {
    let doc = document(&Documentation::default());

    assert_eq!(
        response_ref(&doc, "/notes/titles/", "get", "200"),
        "#/components/schemas/NoteTitleListResponse"
    );
    assert_eq!(component(&doc, "NoteTitleList")["type"], "array");
}

#[test]
fn destroy_uses_the_shared_success_response() {
    let doc = document(&Documentation::default());

    assert_eq!(
        response_ref(&doc, "/notes/{id}/", "delete", "200"),
        "#/components/schemas/SuccessResponse"
    );
    let success = component(&doc, "SuccessResponse");
    assert!(success["properties"]["status"].is_object());
    assert!(success["properties"].get("data").is_none());
}

#[test]
fn actions_envelope_unless_raw() {
    let doc = document(&Documentation::default());

    assert_eq!(
        response_ref(&doc, "/notes/publish/", "post", "200"),
        "#/components/schemas/PublishResultResponse"
    );
    assert_eq!(
        response_ref(&doc, "/notes/summary/", "post", "200"),
        "#/components/schemas/NoteSummary"
    );
    assert!(component(&doc, "NoteSummaryResponse").is_null());
}

#[test]
fn untagged_enum_responses_are_one_of_their_shapes() {
    let doc = document(&Documentation::default());

    assert_eq!(
        response_ref(&doc, "/notes/export/", "post", "200"),
        "#/components/schemas/NoteExportResponse"
    );
    let variants = component(&doc, "NoteExport")["oneOf"].clone();
    assert_eq!(variants.as_array().map(Vec::len), Some(2));
    let text = variants.to_string();
    assert!(text.contains("NoteOut"), "{text}");
    assert!(text.contains("NoteTitle"), "{text}");
}

#[test]
fn update_and_partial_update_are_both_documented() {
    let doc = document(&Documentation::default());
    let item = &doc["paths"]["/notes/{id}/"];

    assert_eq!(
        item["put"]["requestBody"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/CreateNote"
    );
    assert_eq!(
        item["patch"]["requestBody"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/PatchNote"
    );
}

// ---------------------------------------------------------------------------
// Operation metadata
// ---------------------------------------------------------------------------

#[test]
fn default_operation_ids_and_tags_come_from_the_path() {
    let doc = document(&Documentation::default());

    assert_eq!(doc["paths"]["/notes/"]["get"]["operationId"], "notes_list");
    assert_eq!(doc["paths"]["/notes/{id}/"]["patch"]["operationId"], "notes_partial_update");
    assert_eq!(doc["paths"]["/notes/publish/"]["post"]["operationId"], "notes_publish_create");
    assert_eq!(doc["paths"]["/notes/"]["get"]["tags"], json!(["notes"]));
}

#[test]
fn list_operations_document_query_parameters() {
    let doc = document(&Documentation::default());

    let names: Vec<&str> = doc["paths"]["/notes/"]["get"]["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    for expected in ["pagination", "page", "page_size", "cursor", "orderby"] {
        assert!(names.contains(&expected), "missing {expected}");
    }

    let detail = &doc["paths"]["/notes/{id}/"]["get"]["parameters"][0];
    assert_eq!(detail["name"], "id");
    assert_eq!(detail["in"], "path");
}

#[test]
fn documentation_overrides_are_applied() {
    let docs = Documentation::from_yaml_str(DOCS).unwrap();
    let doc = document(&docs);

    let list = &doc["paths"]["/notes/"]["get"];
    assert_eq!(list["operationId"], "notes_index");
    assert_eq!(list["summary"], "List notes");
    assert_eq!(list["description"], "Every note, newest first.");
    assert_eq!(list["x-code-samples"][0]["label"], "cURL");

    let create = &doc["paths"]["/notes/"]["post"];
    assert_eq!(create["operationId"], "notes_create");
    assert_eq!(create["summary"], "Create a note");
    assert_eq!(create["x-badges"], json!(["Beta"]));

    assert_eq!(doc["paths"]["/notes/{id}/"]["delete"]["deprecated"], true);
    assert!(doc["paths"]["/notes/{id}/"]["get"].get("deprecated").is_none());
}

#[test]
fn operations_without_docs_have_no_description() {
    let doc = document(&Documentation::default());

    assert!(doc["paths"]["/notes/"]["get"].get("description").is_none());
    assert!(doc["paths"]["/notes/"]["get"].get("summary").is_none());
}

#[test]
fn info_uses_settings() {
    let doc = document(&Documentation::default());

    assert_eq!(doc["info"]["title"], "Notes");
    assert_eq!(doc["info"]["version"], "1.0.0");
}

// ---------------------------------------------------------------------------
// Missing documentation warnings
// ---------------------------------------------------------------------------

/// Log output collected by a test subscriber.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Warnings logged while generating the document with `settings`.
fn warnings_for(settings: &ApiSettings, docs: &Documentation) -> Vec<String> {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    let store = NoteStore::default();
    tracing::subscriber::with_default(subscriber, || {
        notes_api(&store).openapi_with_docs(settings, docs);
    });

    let bytes = captured.0.lock().unwrap().clone();
    String::from_utf8(bytes)
        .unwrap()
        .lines()
        .filter(|line| line.contains("No additional documentation"))
        .map(str::to_string)
        .collect()
}

#[test]
fn missing_docs_warn_in_debug_mode() {
    let docs = Documentation::from_yaml_str(DOCS).unwrap();
    let warnings = warnings_for(&test_settings(), &docs);

    assert!(warnings
        .iter()
        .any(|w| w.contains("notes.views.NoteTitleView") && w.contains("method=GET")));
    assert!(warnings
        .iter()
        .any(|w| w.contains("notes.views.NotePublishView") && w.contains("method=POST")));
    // Documented view/method pairs stay quiet.
    assert!(!warnings
        .iter()
        .any(|w| w.contains("notes.views.NoteListView") && w.contains("method=GET")));
}

#[test]
fn missing_docs_are_silent_outside_debug_mode() {
    let settings = ApiSettings {
        debug: false,
        ..test_settings()
    };

    assert!(warnings_for(&settings, &Documentation::default()).is_empty());
}
