//! Fixed dashboard document for a single custom widget.
use crate::artifact::{HTML_ATTACHMENT, JS_ATTACHMENT};
use crate::manifest::Manifest;
use serde_json::{json, Map, Value};

pub const DASHBOARD_VERSION: &str = "24.1.23.1";
const WIDGET_ID: &str = "4e2d534c";

/// Dashboard shell with one custom widget named after the dashboard.
///
/// Only `name` and `title` vary; the widget schema is fixed. Attachments
/// start empty and are filled through [`Manifest::upsert`].
pub fn dashboard_manifest(name: &str, title: &str) -> Manifest {
    let mut custom_widgets = Map::new();
    custom_widgets.insert(
        name.to_string(),
        json!({
            "artifacts": {
                "main": {
                    "attachment": HTML_ATTACHMENT,
                    "content_type": "text/html",
                    "is_template": false
                },
                "main.js": {
                    "attachment": JS_ATTACHMENT,
                    "content_type": "text/javascript",
                    "is_template": false
                }
            }
        }),
    );

    let doc = json!({
        "name": name,
        "label": title,
        "live_edit": true,
        "version": DASHBOARD_VERSION,
        "description": title,
        "enabled": false,
        "dashboard_sections": [
            {
                "title": title,
                "widgets": [widget(name, title)]
            }
        ],
        "custom_widgets": Value::Object(custom_widgets),
        "attachments": []
    });
    Manifest::from_value(doc).expect("dashboard template is a valid manifest")
}

fn widget(name: &str, title: &str) -> Value {
    json!({
        "title": title,
        "widget_type": "custom_widget",
        "widget_implementation": format!("{name}/{name}"),
        "min_width": 12,
        "min_height": 12,
        "widget_id": WIDGET_ID,
        "fixed_variables": {
            "schema": form_schema(),
            "uiSchema": ui_schema(),
            "pipeline": "simple-pipeline-save-dataset",
            "pipelineVersion": "1.1.0.0",
            "pipelinePublished": false
        }
    })
}

fn form_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "test1": { "type": "string", "title": "Test 1" },
            "enum_test": {
                "title": "Enum Test",
                "type": "string",
                "enum": ["Min", "Max", "Avg", "Sum", "Cardinality"]
            },
            "num_test": { "type": "number", "title": "Any Number" },
            "query_test": { "type": "string", "title": "Query Test" }
        },
        "required": ["test1", "num_test", "query_test"]
    })
}

fn ui_schema() -> Value {
    json!({
        "type": "VerticalLayout",
        "elements": [
            {
                "type": "HorizontalLayout",
                "elements": [
                    { "type": "Control", "scope": "#/properties/test1" },
                    { "type": "Control", "scope": "#/properties/enum_test" }
                ]
            },
            { "type": "Control", "scope": "#/properties/num_test" },
            {
                "type": "Control",
                "scope": "#/properties/query_test",
                "options": {
                    "apiUrl": "/api/v2/pstreams/pstream/att_app_cmdb/data?offset=0&limit=100",
                    "labelField": "Number",
                    "valueField": "Number"
                }
            }
        ]
    })
}
