//! Filter expression structures
//!
//! A filter holds at most one constraint per field name plus a conjunction
//! group (`$and`) of nested filters. All parts are combined with AND.
//!
//! JSON form:
//!
//! ```text
//! {"is_active": true, "_id": {"$lte": 100}, "$and": [{"age": {"$gte": 18}}]}
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::batch::{BatchError, BatchResult};

/// Reserved key of the conjunction group
pub const AND_KEY: &str = "$and";

/// Comparison operators
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// field = value
    Eq(Value),
    /// field != value (also true when the field is missing)
    Ne(Value),
    /// field > value
    Gt(Value),
    /// field >= value
    Gte(Value),
    /// field < value
    Lt(Value),
    /// field <= value
    Lte(Value),
    /// field equals one of the values
    In(Vec<Value>),
}

impl FilterOp {
    /// Returns the operator name as written in JSON filters
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "$eq",
            FilterOp::Ne(_) => "$ne",
            FilterOp::Gt(_) => "$gt",
            FilterOp::Gte(_) => "$gte",
            FilterOp::Lt(_) => "$lt",
            FilterOp::Lte(_) => "$lte",
            FilterOp::In(_) => "$in",
        }
    }

    /// Returns true for the four ordering operators
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            FilterOp::Gt(_) | FilterOp::Gte(_) | FilterOp::Lt(_) | FilterOp::Lte(_)
        )
    }

    /// Builds an operator from its JSON name and operand
    pub fn from_json(name: &str, operand: &Value) -> BatchResult<Self> {
        let op = match name {
            "$eq" => FilterOp::Eq(operand.clone()),
            "$ne" => FilterOp::Ne(operand.clone()),
            "$gt" => FilterOp::Gt(operand.clone()),
            "$gte" => FilterOp::Gte(operand.clone()),
            "$lt" => FilterOp::Lt(operand.clone()),
            "$lte" => FilterOp::Lte(operand.clone()),
            "$in" => match operand {
                Value::Array(values) => FilterOp::In(values.clone()),
                other => return Err(BatchError::invalid_argument("filter.$in", other)),
            },
            unknown => return Err(BatchError::invalid_argument("filter", unknown)),
        };
        Ok(op)
    }

    fn operand_json(&self) -> Value {
        match self {
            FilterOp::Eq(v)
            | FilterOp::Ne(v)
            | FilterOp::Gt(v)
            | FilterOp::Gte(v)
            | FilterOp::Lt(v)
            | FilterOp::Lte(v) => v.clone(),
            FilterOp::In(values) => Value::Array(values.clone()),
        }
    }
}

/// What a filter requires of one field
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Literal equality
    Eq(Value),
    /// Every operator must hold
    Ops(Vec<FilterOp>),
}

impl Constraint {
    /// A literal, or an object whose keys are all operators
    pub fn from_json(value: &Value) -> BatchResult<Self> {
        if let Value::Object(map) = value {
            if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) {
                let ops = map
                    .iter()
                    .map(|(name, operand)| FilterOp::from_json(name, operand))
                    .collect::<BatchResult<Vec<_>>>()?;
                return Ok(Constraint::Ops(ops));
            }
        }
        Ok(Constraint::Eq(value.clone()))
    }

    pub fn to_json(&self) -> Value {
        match self {
            Constraint::Eq(value) => {
                // A literal that looks like an operator object must be spelled out
                let ambiguous = value
                    .as_object()
                    .map(|m| !m.is_empty() && m.keys().all(|k| k.starts_with('$')))
                    .unwrap_or(false);
                if ambiguous {
                    let mut map = Map::new();
                    map.insert("$eq".to_string(), value.clone());
                    Value::Object(map)
                } else {
                    value.clone()
                }
            }
            Constraint::Ops(ops) => {
                let mut map = Map::new();
                for op in ops {
                    map.insert(op.op_name().to_string(), op.operand_json());
                }
                Value::Object(map)
            }
        }
    }

    /// Adds an operator, replacing one of the same kind
    fn push_op(self, op: FilterOp) -> Self {
        let mut ops = match self {
            Constraint::Eq(value) => vec![FilterOp::Eq(value)],
            Constraint::Ops(ops) => ops,
        };
        match ops.iter_mut().find(|o| o.op_name() == op.op_name()) {
            Some(existing) => *existing = op,
            None => ops.push(op),
        }
        Constraint::Ops(ops)
    }
}

/// Structured query filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: BTreeMap<String, Constraint>,
    and: Vec<Filter>,
}

impl Filter {
    /// Filter that matches every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Parses the JSON form
    pub fn from_json(value: &Value) -> BatchResult<Self> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::all()),
            other => return Err(BatchError::invalid_argument("filter", other)),
        };

        let mut filter = Self::all();
        for (key, inner) in map {
            if key == AND_KEY {
                let members = inner
                    .as_array()
                    .ok_or_else(|| BatchError::invalid_argument("filter.$and", inner))?;
                for member in members {
                    if !member.is_object() {
                        return Err(BatchError::invalid_argument("filter.$and", member));
                    }
                    filter.and.push(Self::from_json(member)?);
                }
            } else if key.starts_with('$') {
                return Err(BatchError::invalid_argument("filter", key));
            } else {
                filter
                    .fields
                    .insert(key.clone(), Constraint::from_json(inner)?);
            }
        }
        Ok(filter)
    }

    /// Renders the JSON form
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (field, constraint) in &self.fields {
            map.insert(field.clone(), constraint.to_json());
        }
        if !self.and.is_empty() {
            map.insert(
                AND_KEY.to_string(),
                Value::Array(self.and.iter().map(Filter::to_json).collect()),
            );
        }
        Value::Object(map)
    }

    /// Requires `field` to equal `value`, replacing any constraint on it
    pub fn with_eq(self, field: impl Into<String>, value: Value) -> Self {
        self.with_constraint(field, Constraint::Eq(value))
    }

    /// Adds an operator to the constraint on `field`
    pub fn with_op(mut self, field: impl Into<String>, op: FilterOp) -> Self {
        let field = field.into();
        let constraint = match self.fields.remove(&field) {
            Some(existing) => existing.push_op(op),
            None => Constraint::Ops(vec![op]),
        };
        self.fields.insert(field, constraint);
        self
    }

    /// Sets the constraint on `field`, replacing any previous one
    pub fn with_constraint(mut self, field: impl Into<String>, constraint: Constraint) -> Self {
        self.fields.insert(field.into(), constraint);
        self
    }

    /// Appends a member to the conjunction group
    pub fn with_and(mut self, member: Filter) -> Self {
        self.and.push(member);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.and.is_empty()
    }

    pub fn constraint(&self, field: &str) -> Option<&Constraint> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn and_members(&self) -> &[Filter] {
        &self.and
    }

    pub(crate) fn take_constraint(&mut self, field: &str) -> Option<Constraint> {
        self.fields.remove(field)
    }

    pub(crate) fn set_constraint(&mut self, field: &str, constraint: Constraint) {
        self.fields.insert(field.to_string(), constraint);
    }

    pub(crate) fn push_and(&mut self, member: Filter) {
        self.and.push(member);
    }
}
