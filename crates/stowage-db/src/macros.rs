//! Macros for declaring persistable types and query parameter sets.
//!
//! [`define_resource!`] generates typed column constants for a struct and
//! implements [`crate::traits::Describe`], [`crate::traits::Record`] and
//! [`crate::traits::Resource`] for it. [`define_query!`] does the same for
//! a query's parameters, without the ability to materialize rows.

/// Declares a struct as a persistable resource.
///
/// # Syntax
///
/// ```ignore
/// define_resource!(
///     ChannelMessage as message {
///         table: "Message",
///         columns: {
///             #[primary_key]
///             ID(id): String => "id",
///             CHANNEL_NAME(channel_name): String => "channelName",
///             POSTED_DATE(posted_date): DateTime<Utc> => "postedDate"
///         }
///     }
/// );
/// ```
///
/// Each entry reads `CONST(struct_field): RustType => "column"`. This
/// expands to a module of column constants:
///
/// ```ignore
/// pub mod message {
///     pub const TABLE: &str = "Message";
///     pub const ID: stowage_db::expr::Col<String> = stowage_db::expr::Col::new("id");
///     // ...
/// }
/// ```
///
/// plus the trait impls. The struct must implement `Default`, and every
/// field type must implement [`crate::value::ColumnValue`].
#[macro_export]
macro_rules! define_resource {
    (
        $ty:ident as $entity:ident {
            table: $table:literal,
            columns: {
                $($(#[$marker:ident])? $col_name:ident($field:ident): $col_type:ty => $db_col:literal),* $(,)?
            }
        }
    ) => {
        $crate::define_columns!($entity, $table, $($col_name: $col_type => $db_col),*);

        impl $crate::traits::Describe for $ty {
            fn type_descriptor() -> $crate::descriptor::TypeDescriptor {
                $crate::descriptor::TypeDescriptor::new(
                    $table,
                    vec![$(
                        $crate::__field_descriptor!($col_type, $db_col)
                            .primary_key($crate::__is_primary_key!($($marker)?))
                    ),*],
                )
            }
        }

        $crate::__impl_record!($ty, $($field: $db_col),*);

        impl $crate::traits::Resource for $ty {
            fn set_field(
                &mut self,
                name: &str,
                value: $crate::Value,
            ) -> $crate::error::Result<()> {
                match name {
                    $(
                        $db_col => {
                            self.$field = $crate::value::ColumnValue::from_value(value)
                                .map_err(|e| e.for_field($db_col))?;
                            Ok(())
                        }
                    )*
                    _ => Err($crate::error::DbError::UnknownField {
                        type_name: $table.to_string(),
                        field: name.to_string(),
                    }),
                }
            }
        }
    };
}

/// Declares the parameters of a query type.
///
/// # Syntax
///
/// ```ignore
/// define_query!(
///     RecentChannelMessages as recent_messages {
///         name: "RecentChannelMessages",
///         params: {
///             CHANNEL(channel): String => "channel"
///         }
///     }
/// );
/// ```
///
/// The descriptor lists the parameters in declaration order, which is also
/// the order they appear in the query's signature.
#[macro_export]
macro_rules! define_query {
    (
        $ty:ident as $entity:ident {
            name: $name:literal,
            params: {
                $($col_name:ident($field:ident): $col_type:ty => $param:literal),* $(,)?
            }
        }
    ) => {
        $crate::define_columns!($entity, $name, $($col_name: $col_type => $param),*);

        impl $crate::traits::Describe for $ty {
            fn type_descriptor() -> $crate::descriptor::TypeDescriptor {
                $crate::descriptor::TypeDescriptor::new(
                    $name,
                    vec![$($crate::__field_descriptor!($col_type, $param)),*],
                )
            }
        }

        $crate::__impl_record!($ty, $($field: $param),*);
    };
}

/// Generates a module of typed column constants.
#[macro_export]
macro_rules! define_columns {
    ($entity:ident, $table:literal, $($col_name:ident: $col_type:ty => $db_col:literal),* $(,)?) => {
        pub mod $entity {
            #[allow(unused_imports)]
            use super::*;
            use $crate::expr::column::Col;

            pub const TABLE: &str = $table;

            $(
                pub const $col_name: Col<$col_type> = Col::new($db_col);
            )*
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_descriptor {
    ($col_type:ty, $db_col:literal) => {
        $crate::descriptor::FieldDescriptor::new(
            $db_col,
            <$col_type as $crate::value::ColumnValue>::FIELD_TYPE,
        )
        .nullable(<$col_type as $crate::value::ColumnValue>::NULLABLE)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __impl_record {
    ($ty:ident, $($field:ident: $db_col:literal),*) => {
        impl $crate::traits::Record for $ty {
            fn field(&self, name: &str) -> Option<$crate::Value> {
                match name {
                    $($db_col => Some($crate::value::ColumnValue::to_value(&self.$field)),)*
                    _ => None,
                }
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __is_primary_key {
    () => {
        false
    };
    (primary_key) => {
        true
    };
}

#[cfg(test)]
mod tests {
    use rusqlite::types::Value;

    use crate::{
        error::DbError,
        traits::{Describe, Record, Resource},
        value::FieldType,
    };

    #[derive(Debug, Default, PartialEq)]
    struct Bookmark {
        url: String,
        title: Option<String>,
        visits: i64,
        starred: bool,
    }

    define_resource!(
        Bookmark as bookmark {
            table: "Bookmark",
            columns: {
                #[primary_key]
                URL(url): String => "url",
                TITLE(title): Option<String> => "title",
                VISITS(visits): i64 => "visits",
                STARRED(starred): bool => "starred",
            }
        }
    );

    #[derive(Debug, Default)]
    struct BookmarksByTag {
        tag: String,
        limit: u32,
    }

    define_query!(
        BookmarksByTag as bookmarks_by_tag {
            name: "BookmarksByTag",
            params: {
                TAG(tag): String => "tag",
                LIMIT(limit): u32 => "limit"
            }
        }
    );

    #[test]
    fn test_resource_descriptor() {
        let descriptor = Bookmark::type_descriptor();

        assert_eq!(descriptor.name, bookmark::TABLE);
        assert_eq!(
            descriptor.field_names().collect::<Vec<_>>(),
            ["url", "title", "visits", "starred"]
        );
        assert_eq!(descriptor.primary_key().unwrap().name, "url");
        assert!(descriptor.field("title").unwrap().nullable);
        assert_eq!(descriptor.field("starred").unwrap().field_type, FieldType::Boolean);
        assert_eq!(bookmark::VISITS.name, "visits");
    }

    #[test]
    fn test_resource_field_access() {
        let mut item = Bookmark::default();
        item.set_field("url", Value::Text("https://example.org".into()))
            .unwrap();
        item.set_field("title", Value::Null).unwrap();
        item.set_field("visits", Value::Integer(3)).unwrap();
        item.set_field("starred", Value::Integer(1)).unwrap();

        assert_eq!(
            item,
            Bookmark {
                url: "https://example.org".into(),
                title: None,
                visits: 3,
                starred: true,
            }
        );
        assert_eq!(item.field("visits"), Some(Value::Integer(3)));
        assert_eq!(item.field("missing"), None);

        let err = item.set_field("missing", Value::Null).unwrap_err();
        assert!(matches!(err, DbError::UnknownField { .. }));

        let err = item
            .set_field("visits", Value::Text("many".into()))
            .unwrap_err();
        assert!(matches!(err, DbError::FieldValue { ref field, .. } if field == "visits"));
    }

    #[test]
    fn test_query_descriptor() {
        let descriptor = BookmarksByTag::type_descriptor();
        assert_eq!(descriptor.name, "BookmarksByTag");
        assert_eq!(descriptor.field_names().collect::<Vec<_>>(), ["tag", "limit"]);

        let query = BookmarksByTag {
            tag: "rust".into(),
            limit: 5,
        };
        assert_eq!(query.field("limit"), Some(Value::Integer(5)));
        assert_eq!(bookmarks_by_tag::TAG.name, "tag");
    }
}
