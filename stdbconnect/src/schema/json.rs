// Parsing of the JSON schema descriptor.
//
// A type is either a plain string naming a primitive (`"u32"`, `"string"`,
// ...) or a single-key object: `{"array": T}`, `{"option": T}`,
// `{"product": [{"name": N, "type": T}, ...]}`, `{"sum": [...]}`,
// `{"ref": n}`. References point into the top-level `typespace` array and
// are expanded here; cycles and out-of-range references are rejected.

use serde_json::Value;

use crate::schema::{Reducer, Schema, Table};
use crate::types::{AlgebraicType, Column};
use crate::{StdbError, StdbResult};

pub(super) fn parse_schema(descriptor: &str) -> StdbResult<Schema> {
    let root: Value = serde_json::from_str(descriptor)?;

    let raw_typespace = match root.get("typespace") {
        Some(Value::Array(entries)) => entries
            .iter()
            .map(parse_type)
            .collect::<StdbResult<Vec<AlgebraicType>>>()?,
        Some(_) => return Err(StdbError::MissingField("typespace".to_string())),
        None => Vec::new(),
    };
    let typespace = resolve_typespace(raw_typespace)?;

    let tables = array_field(&root, "tables")?
        .iter()
        .map(|entry| parse_table(entry, &typespace))
        .collect::<StdbResult<Vec<Table>>>()?;

    let reducers = array_field(&root, "reducers")?
        .iter()
        .map(|entry| parse_reducer(entry, &typespace))
        .collect::<StdbResult<Vec<Reducer>>>()?;

    let schema = Schema {
        tables,
        reducers,
        typespace,
    };
    schema.validate()?;
    debug!(
        "parsed schema with {} tables, {} reducers, {} typespace entries",
        schema.tables.len(),
        schema.reducers.len(),
        schema.typespace.len()
    );
    Ok(schema)
}

fn array_field<'v>(root: &'v Value, name: &str) -> StdbResult<&'v Vec<Value>> {
    match root.get(name) {
        Some(Value::Array(entries)) => Ok(entries),
        _ => Err(StdbError::MissingField(name.to_string())),
    }
}

fn string_field(entry: &Value, name: &str) -> StdbResult<String> {
    entry
        .get(name)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| StdbError::MissingField(name.to_string()))
}

fn parse_table(entry: &Value, typespace: &[AlgebraicType]) -> StdbResult<Table> {
    let name = string_field(entry, "name")?;
    let columns = entry
        .get("columns")
        .and_then(Value::as_array)
        .ok_or_else(|| StdbError::MissingField("columns".to_string()))?
        .iter()
        .map(|column| parse_column(column, typespace))
        .collect::<StdbResult<Vec<Column>>>()?;

    // absent and empty both mean: no declared primary key
    let primary_key = match entry.get("primary_key") {
        Some(Value::Array(indices)) => indices
            .iter()
            .map(|index| {
                index
                    .as_u64()
                    .and_then(|index| usize::try_from(index).ok())
                    .ok_or_else(|| StdbError::MissingField("primary_key".to_string()))
            })
            .collect::<StdbResult<Vec<usize>>>()?,
        _ => Vec::new(),
    };

    Ok(Table {
        name,
        columns,
        primary_key,
    })
}

fn parse_reducer(entry: &Value, typespace: &[AlgebraicType]) -> StdbResult<Reducer> {
    let name = string_field(entry, "name")?;
    let params = entry
        .get("params")
        .and_then(Value::as_array)
        .ok_or_else(|| StdbError::MissingField("params".to_string()))?
        .iter()
        .map(|param| parse_column(param, typespace))
        .collect::<StdbResult<Vec<Column>>>()?;
    Ok(Reducer { name, params })
}

fn parse_column(entry: &Value, typespace: &[AlgebraicType]) -> StdbResult<Column> {
    let name = entry.get("name").and_then(Value::as_str);
    let ty = entry
        .get("type")
        .ok_or_else(|| StdbError::MissingField("type".to_string()))?;
    Ok(Column {
        name: name.map(ToString::to_string),
        ty: resolve(parse_type(ty)?, typespace, 0)?,
    })
}

fn parse_type(entry: &Value) -> StdbResult<AlgebraicType> {
    match entry {
        Value::String(name) => parse_primitive(name),
        Value::Object(map) => {
            let (key, body) = map
                .iter()
                .next()
                .ok_or_else(|| StdbError::UnknownType("{}".to_string()))?;
            match key.as_str() {
                "array" => Ok(AlgebraicType::Array(Box::new(parse_type(body)?))),
                "option" => Ok(AlgebraicType::Option(Box::new(parse_type(body)?))),
                "product" => Ok(AlgebraicType::Product(parse_members(body)?)),
                "sum" => Ok(AlgebraicType::Sum(parse_members(body)?)),
                "ref" => {
                    let index = body
                        .as_u64()
                        .and_then(|index| usize::try_from(index).ok())
                        .ok_or_else(|| StdbError::UnknownType(key.clone()))?;
                    Ok(AlgebraicType::Ref(index))
                }
                other => Err(StdbError::UnknownType(other.to_string())),
            }
        }
        other => Err(StdbError::UnknownType(other.to_string())),
    }
}

fn parse_members(body: &Value) -> StdbResult<Vec<Column>> {
    body.as_array()
        .ok_or_else(|| StdbError::MissingField("members".to_string()))?
        .iter()
        .map(|member| {
            let name = member.get("name").and_then(Value::as_str);
            let ty = member
                .get("type")
                .ok_or_else(|| StdbError::MissingField("type".to_string()))?;
            Ok(Column {
                name: name.map(ToString::to_string),
                ty: parse_type(ty)?,
            })
        })
        .collect()
}

fn parse_primitive(name: &str) -> StdbResult<AlgebraicType> {
    Ok(match name {
        "bool" => AlgebraicType::Bool,
        "u8" => AlgebraicType::U8,
        "i8" => AlgebraicType::I8,
        "u16" => AlgebraicType::U16,
        "i16" => AlgebraicType::I16,
        "u32" => AlgebraicType::U32,
        "i32" => AlgebraicType::I32,
        "u64" => AlgebraicType::U64,
        "i64" => AlgebraicType::I64,
        "u128" => AlgebraicType::U128,
        "i128" => AlgebraicType::I128,
        "u256" => AlgebraicType::U256,
        "i256" => AlgebraicType::I256,
        "f32" => AlgebraicType::F32,
        "f64" => AlgebraicType::F64,
        "string" => AlgebraicType::String,
        "bytes" => AlgebraicType::Bytes,
        other => return Err(StdbError::UnknownType(other.to_string())),
    })
}

// A ref may point at another ref; the chain must terminate within the
// typespace. The depth guard bounds chains by the typespace size, which any
// acyclic chain satisfies.
fn resolve(
    ty: AlgebraicType,
    typespace: &[AlgebraicType],
    depth: usize,
) -> StdbResult<AlgebraicType> {
    Ok(match ty {
        AlgebraicType::Ref(index) => {
            if depth > typespace.len() {
                return Err(StdbError::InvalidTypeRef(index));
            }
            let target = typespace
                .get(index)
                .ok_or(StdbError::InvalidTypeRef(index))?
                .clone();
            resolve(target, typespace, depth + 1)?
        }
        AlgebraicType::Array(inner) => {
            AlgebraicType::Array(Box::new(resolve(*inner, typespace, depth)?))
        }
        AlgebraicType::Option(inner) => {
            AlgebraicType::Option(Box::new(resolve(*inner, typespace, depth)?))
        }
        AlgebraicType::Product(columns) => {
            AlgebraicType::Product(resolve_members(columns, typespace, depth)?)
        }
        AlgebraicType::Sum(columns) => {
            AlgebraicType::Sum(resolve_members(columns, typespace, depth)?)
        }
        other => other,
    })
}

fn resolve_members(
    columns: Vec<Column>,
    typespace: &[AlgebraicType],
    depth: usize,
) -> StdbResult<Vec<Column>> {
    columns
        .into_iter()
        .map(|column| {
            Ok(Column {
                name: column.name,
                ty: resolve(column.ty, typespace, depth)?,
            })
        })
        .collect()
}

fn resolve_typespace(raw: Vec<AlgebraicType>) -> StdbResult<Vec<AlgebraicType>> {
    let snapshot = raw.clone();
    raw.into_iter()
        .map(|ty| resolve(ty, &snapshot, 0))
        .collect()
}
