//! Tantivy schema derived from the field policy registry.
//!
//! Every field with a registry entry becomes a stored text field indexed
//! per its policy. Values of fields without an entry go into one dynamic
//! JSON field tokenized with the registry's default policy.

use std::collections::BTreeMap;

use tantivy::schema::{
    Field, IndexRecordOption, JsonObjectOptions, Schema, TextFieldIndexing, TextOptions,
};

use crate::policy::{FieldPolicy, FieldPolicyRegistry};
use crate::SearchError;

/// Node id, the key used for updates and deletes
pub const NODE_ID_FIELD: &str = "__NodeId";
/// `content` or `media`
pub const INDEX_TYPE_FIELD: &str = "__IndexType";
/// Hierarchy path of the node, one raw token
pub const PATH_FIELD: &str = "__Path";
/// Lower-cased item type, for type-scoped queries
pub const NODE_TYPE_ALIAS_FIELD: &str = "__NodeTypeAlias";
/// Catch-all for fields without a registry entry
pub const DYNAMIC_FIELD: &str = "__Fields";

fn indexing_for(policy: &FieldPolicy) -> TextFieldIndexing {
    let record = if policy.is_raw() {
        IndexRecordOption::Basic
    } else {
        IndexRecordOption::WithFreqsAndPositions
    };
    TextFieldIndexing::default()
        .set_tokenizer(policy.tokenizer_name())
        .set_index_option(record)
}

fn text_options(policy: &FieldPolicy) -> TextOptions {
    TextOptions::default()
        .set_indexing_options(indexing_for(policy))
        .set_stored()
}

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct SearchSchema {
    schema: Schema,
    /// Node id (raw | stored)
    pub node_id: Field,
    /// Index type (raw | stored)
    pub index_type: Field,
    /// Path (raw | stored)
    pub path: Field,
    /// Lower-cased item type (custom analyzer | stored)
    pub node_type_alias: Field,
    /// Dynamic JSON field for undeclared values
    pub dynamic: Field,
    fields: BTreeMap<String, Field>,
}

impl SearchSchema {
    /// Build the schema for a registry.
    pub fn build(registry: &FieldPolicyRegistry) -> Result<Self, SearchError> {
        registry.validate()?;

        let mut schema_builder = Schema::builder();
        for (name, policy) in registry.fields() {
            schema_builder.add_text_field(name, text_options(policy));
        }

        let dynamic_options = JsonObjectOptions::default()
            .set_stored()
            .set_indexing_options(indexing_for(registry.default_policy()));
        schema_builder.add_json_field(DYNAMIC_FIELD, dynamic_options);

        Self::from_schema(schema_builder.build(), registry)
    }

    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create a SearchSchema from an existing Tantivy Schema.
    ///
    /// Fails when a field the registry expects is missing.
    pub fn from_schema(schema: Schema, registry: &FieldPolicyRegistry) -> Result<Self, SearchError> {
        let lookup = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaMismatch(format!("missing {} field", name)))
        };

        let mut fields = BTreeMap::new();
        for (name, _) in registry.fields() {
            fields.insert(name.to_string(), lookup(name)?);
        }

        Ok(Self {
            node_id: lookup(NODE_ID_FIELD)?,
            index_type: lookup(INDEX_TYPE_FIELD)?,
            path: lookup(PATH_FIELD)?,
            node_type_alias: lookup(NODE_TYPE_ALIAS_FIELD)?,
            dynamic: lookup(DYNAMIC_FIELD)?,
            fields,
            schema,
        })
    }

    /// Handle of a declared field.
    pub fn field(&self, name: &str) -> Option<Field> {
        self.fields.get(name).copied()
    }

    /// True for the fields the indexer derives itself.
    pub fn is_system_field(name: &str) -> bool {
        matches!(
            name,
            NODE_ID_FIELD | INDEX_TYPE_FIELD | PATH_FIELD | NODE_TYPE_ALIAS_FIELD | DYNAMIC_FIELD
        )
    }

    /// Declared fields tokenized for free text (query parser defaults).
    pub fn text_fields(&self, registry: &FieldPolicyRegistry) -> Vec<Field> {
        let mut text: Vec<Field> = registry
            .fields()
            .filter(|(name, policy)| !policy.is_raw() && !Self::is_system_field(name))
            .filter_map(|(name, _)| self.field(name))
            .collect();
        text.push(self.dynamic);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tantivy::schema::FieldType;

    fn tokenizer_of(schema: &SearchSchema, name: &str) -> String {
        let field = schema.schema().get_field(name).unwrap();
        match schema.schema().get_field_entry(field).field_type() {
            FieldType::Str(options) => options
                .get_indexing_options()
                .unwrap()
                .tokenizer()
                .to_string(),
            other => panic!("unexpected field type {:?}", other),
        }
    }

    #[test]
    fn test_build_schema() {
        let schema = SearchSchema::build(&FieldPolicyRegistry::new()).unwrap();
        assert!(schema.schema().get_field(NODE_ID_FIELD).is_ok());
        assert!(schema.schema().get_field(PATH_FIELD).is_ok());
        assert!(schema.schema().get_field(DYNAMIC_FIELD).is_ok());
        assert!(schema.field("nodeName").is_some());
        assert!(schema.field("bodyText").is_none());
    }

    #[test]
    fn test_field_tokenizers_follow_policy() {
        let schema = SearchSchema::build(&FieldPolicyRegistry::new()).unwrap();
        assert_eq!(tokenizer_of(&schema, PATH_FIELD), "raw");
        assert_eq!(tokenizer_of(&schema, "nodeName"), "default");
        assert_eq!(
            tokenizer_of(&schema, NODE_TYPE_ALIAS_FIELD),
            "culture-invariant-whitespace"
        );
    }

    #[test]
    fn test_from_schema_detects_missing_field() {
        let original = SearchSchema::build(&FieldPolicyRegistry::new()).unwrap();
        let wider = FieldPolicyRegistry::new().with_field("sku", FieldPolicy::Raw);
        let err = SearchSchema::from_schema(original.schema().clone(), &wider).unwrap_err();
        assert!(matches!(err, SearchError::SchemaMismatch(_)));
    }

    #[test]
    fn test_text_fields_exclude_raw_and_system() {
        let registry = FieldPolicyRegistry::new();
        let schema = SearchSchema::build(&registry).unwrap();
        let text = schema.text_fields(&registry);
        assert!(text.contains(&schema.field("nodeName").unwrap()));
        assert!(!text.contains(&schema.path));
        assert!(!text.contains(&schema.node_type_alias));
        assert!(text.contains(&schema.dynamic));
    }

    #[test]
    fn test_is_system_field() {
        assert!(SearchSchema::is_system_field(PATH_FIELD));
        assert!(!SearchSchema::is_system_field("path"));
    }
}
