//! Table query model: equality filters plus one ordering clause.
//!
//! This is the whole query surface the application needs; it maps one-to-one
//! onto PostgREST query parameters.

use serde_json::Value;

/// Patient collection.
pub const PATIENTS_TABLE: &str = "paciente";
/// Progress-note collection.
pub const EVOLUTIONS_TABLE: &str = "evolucao";

/// `column = value` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }

    /// PostgREST operator form, e.g. `eq.42`.
    pub fn operand(&self) -> String {
        format!("eq.{}", self.value)
    }

    /// Whether a JSON row satisfies this filter.
    pub fn matches(&self, row: &Value) -> bool {
        match row.get(&self.column) {
            Some(Value::String(s)) => *s == self.value,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }

    /// PostgREST form, e.g. `nome.asc`.
    pub fn operand(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

/// `SELECT * FROM table WHERE filters ORDER BY order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    /// Query-string pairs in PostgREST syntax.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(
            self.filters
                .iter()
                .map(|f| (f.column.clone(), f.operand())),
        );
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.operand()));
        }
        pairs
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_postgrest_pairs() {
        let q = Select::from(EVOLUTIONS_TABLE)
            .eq("paciente_id", "abc")
            .order(Order::desc("data"));
        assert_eq!(
            q.query_pairs(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("paciente_id".to_string(), "eq.abc".to_string()),
                ("order".to_string(), "data.desc".to_string()),
            ]
        );
    }

    #[test]
    fn filter_matches_strings_and_scalars() {
        let row = json!({"id": "x", "n": 3, "flag": true, "empty": null});
        assert!(Filter::eq("id", "x").matches(&row));
        assert!(Filter::eq("n", 3).matches(&row));
        assert!(Filter::eq("flag", true).matches(&row));
        assert!(!Filter::eq("empty", "null").matches(&row));
        assert!(!Filter::eq("missing", "x").matches(&row));
    }
}
