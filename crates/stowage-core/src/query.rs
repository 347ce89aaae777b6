//! Parameterized read operations.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use stowage_db::{Record, Resource, SelectQuery, Value};

/// Characters left as-is in signature values: RFC 3986 unreserved.
const SIGNATURE_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A parameterized read over one resource type.
///
/// The query's declared fields are its parameters; they make up the cache
/// signature, so two queries with equal parameters share cached results.
pub trait Query: Record + Send + Sync {
    type Item: Resource;

    /// Applies this query's clauses to a select over [`Self::Item`].
    fn build(&self, select: SelectQuery<Self::Item>) -> SelectQuery<Self::Item>;

    /// Logical path of the query, `/<QueryName>` unless overridden.
    fn path(&self) -> String {
        format!("/{}", Self::type_descriptor().name)
    }

    /// Cache key: [`Query::path`] followed by every declared parameter as
    /// `?name=value&...`, in declaration order, values percent-encoded.
    /// A null parameter appears as its bare name, so it never collides with
    /// an empty string.
    fn signature(&self) -> String {
        let mut signature = self.path();
        let descriptor = Self::type_descriptor();

        let mut head = '?';
        for name in descriptor.field_names() {
            signature.push(head);
            signature.push_str(name);
            head = '&';

            let Some(value) = render_value(self.field(name).unwrap_or(Value::Null)) else {
                continue;
            };
            signature.push('=');
            signature.extend(utf8_percent_encode(&value, SIGNATURE_VALUE));
        }

        signature
    }
}

fn render_value(value: Value) -> Option<String> {
    let rendered = match value {
        Value::Null => return None,
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s,
        Value::Blob(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect(),
    };
    Some(rendered)
}
