use std::collections::HashMap;

use crate::{descriptor::TypeDescriptor, value::FieldType};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub field_type: FieldType,
    pub primary_key: bool,
}

/// The migrated shape of a table, as seen by the query executor.
///
/// Column lookup ignores ASCII case, matching how SQLite resolves
/// identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableInfo {
    name: String,
    columns: Vec<ColumnInfo>,
    index: HashMap<String, usize>,
}

impl TableInfo {
    pub fn from_descriptor(descriptor: &TypeDescriptor) -> Self {
        let columns: Vec<ColumnInfo> = descriptor
            .fields
            .iter()
            .map(|f| ColumnInfo {
                name: f.name.clone(),
                field_type: f.field_type,
                primary_key: f.is_primary_key,
            })
            .collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.to_ascii_lowercase(), i))
            .collect();

        Self {
            name: descriptor.name.clone(),
            columns,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&i| &self.columns[i])
    }

    pub fn primary_key(&self) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.primary_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDescriptor;

    #[test]
    fn test_table_info_from_descriptor() {
        let descriptor = TypeDescriptor::new(
            "Message",
            vec![
                FieldDescriptor::new("id", FieldType::Text).primary_key(true),
                FieldDescriptor::new("postedDate", FieldType::Timestamp),
            ],
        );
        let table = TableInfo::from_descriptor(&descriptor);

        assert_eq!(table.name(), "Message");
        assert_eq!(table.columns().len(), 2);
        assert_eq!(
            table.column("postedDate").map(|c| c.field_type),
            Some(FieldType::Timestamp)
        );
        assert_eq!(table.primary_key().map(|c| c.name.as_str()), Some("id"));
        assert!(table.column("text").is_none());
    }

    #[test]
    fn test_column_lookup_ignores_case() {
        let descriptor = TypeDescriptor::new(
            "Message",
            vec![FieldDescriptor::new("channelName", FieldType::Text)],
        );
        let table = TableInfo::from_descriptor(&descriptor);

        assert_eq!(
            table.column("CHANNELNAME").map(|c| c.name.as_str()),
            Some("channelName")
        );
        assert_eq!(
            table.column("channelname").map(|c| c.name.as_str()),
            Some("channelName")
        );
    }
}
