//! Document mapping from index items to Tantivy documents.
//!
//! Besides the item's own values, every document gets the derived fields:
//! node id, index type, hierarchy path and the lower-cased item type.

use std::collections::BTreeMap;

use tantivy::schema::OwnedValue;
use tantivy::TantivyDocument;

use content_types::{FieldValue, IndexItem};

use crate::error::SearchError;
use crate::schema::SearchSchema;

/// Convert an item to a Tantivy document.
///
/// Fields declared in the schema are written to their own field; values of
/// undeclared fields go to the dynamic JSON field under their name. Values
/// for the derived system fields are ignored, the derived values win.
pub fn item_to_doc(schema: &SearchSchema, item: &IndexItem) -> Result<TantivyDocument, SearchError> {
    // The path must be valid and end at the item's own id.
    let path = item.path()?;

    let mut doc = TantivyDocument::default();
    doc.add_text(schema.node_id, item.id.to_string());
    doc.add_text(schema.index_type, item.index_type.as_str());
    doc.add_text(schema.path, path.to_string());

    let item_type = item.value_set.item_type.trim();
    if !item_type.is_empty() {
        doc.add_text(schema.node_type_alias, item_type.to_lowercase());
    }

    let mut dynamic: BTreeMap<String, OwnedValue> = BTreeMap::new();
    for (name, values) in item.value_set.fields() {
        if SearchSchema::is_system_field(name) {
            continue;
        }
        match schema.field(name) {
            Some(field) => {
                for value in values {
                    doc.add_text(field, value.to_index_text());
                }
            }
            None => {
                let texts = values
                    .iter()
                    .map(FieldValue::to_index_text)
                    .map(OwnedValue::Str)
                    .collect();
                dynamic.insert(name.to_string(), OwnedValue::Array(texts));
            }
        }
    }

    if !dynamic.is_empty() {
        doc.add_object(schema.dynamic, dynamic);
    }

    Ok(doc)
}
