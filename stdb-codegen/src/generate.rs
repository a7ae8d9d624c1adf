//! Emits one Rust module from a parsed schema: a record struct per table
//! implementing `TableRow`, and a calling helper per reducer.
//!
//! Primitive, string and bytes columns map onto native Rust types;
//! composite columns (arrays, options, products, sums) stay
//! `AlgebraicValue`, which keeps the generated code a thin positional
//! wrapper over row decoding.

use std::fmt::Write;

use stdbconnect::{AlgebraicType, Column, Schema};

/// Renders the accessor module for `schema`.
pub fn module(schema: &Schema) -> String {
    let mut out = String::new();
    out.push_str("// Generated by stdb-codegen. Do not edit.\n");
    out.push_str("#![allow(unused_imports)]\n\n");
    out.push_str(
        "use stdbconnect::{AlgebraicValue, DbClient, Field, Row, StdbError, StdbResult, TableRow};\n\n",
    );

    for table in &schema.tables {
        render_table(&mut out, &table.name, &table.columns);
    }

    if !schema.reducers.is_empty() {
        out.push_str("/// One calling helper per reducer.\n");
        out.push_str("pub mod reducers {\n");
        out.push_str("    use super::{AlgebraicValue, DbClient, Field, StdbResult};\n\n");
        for reducer in &schema.reducers {
            render_reducer(&mut out, &reducer.name, &reducer.params);
        }
        out.push_str("}\n");
    }
    out
}

fn render_table(out: &mut String, table: &str, columns: &[Column]) {
    let struct_name = pascal_case(table);
    let _ = writeln!(out, "/// One row of the `{table}` table.");
    let _ = writeln!(out, "#[derive(Debug, Clone, PartialEq)]");
    let _ = writeln!(out, "pub struct {struct_name} {{");
    for (index, column) in columns.iter().enumerate() {
        let _ = writeln!(
            out,
            "    pub {}: {},",
            field_name(column, index),
            rust_type(&column.ty)
        );
    }
    out.push_str("}\n\n");

    let _ = writeln!(out, "impl TableRow for {struct_name} {{");
    let _ = writeln!(out, "    const TABLE_NAME: &'static str = {table:?};");
    out.push('\n');
    let _ = writeln!(out, "    fn from_row(row: &Row) -> StdbResult<Self> {{");
    let _ = writeln!(out, "        Ok(Self {{");
    for (index, column) in columns.iter().enumerate() {
        let name = field_name(column, index);
        let _ = writeln!(
            out,
            "            {name}: row.field({index}){}",
            extract_suffix(&column.ty)
        );
        let _ = writeln!(
            out,
            "                .ok_or(StdbError::MissingField({:?}.to_string()))?,",
            name
        );
    }
    out.push_str("        })\n    }\n}\n\n");
}

fn render_reducer(out: &mut String, reducer: &str, params: &[Column]) {
    let fn_name = snake_case(reducer);
    let mut signature = String::new();
    let mut fields = String::new();
    for (index, param) in params.iter().enumerate() {
        let name = field_name(param, index);
        let _ = write!(signature, ", {name}: {}", rust_type(&param.ty));
        let wire_name = param.name.clone().unwrap_or_else(|| format!("#{index}"));
        let _ = write!(
            fields,
            "Field::new({wire_name:?}, {}), ",
            value_expression(&param.ty, &name)
        );
    }
    let _ = writeln!(
        out,
        "    /// Invokes the `{reducer}` reducer; returns the request id."
    );
    let _ = writeln!(
        out,
        "    pub fn {fn_name}(client: &mut DbClient{signature}) -> StdbResult<u32> {{"
    );
    let _ = writeln!(
        out,
        "        client.call_reducer({reducer:?}, &[{fields}])"
    );
    out.push_str("    }\n\n");
}

fn rust_type(ty: &AlgebraicType) -> &'static str {
    match ty {
        AlgebraicType::Bool => "bool",
        AlgebraicType::U8 => "u8",
        AlgebraicType::I8 => "i8",
        AlgebraicType::U16 => "u16",
        AlgebraicType::I16 => "i16",
        AlgebraicType::U32 => "u32",
        AlgebraicType::I32 => "i32",
        AlgebraicType::U64 => "u64",
        AlgebraicType::I64 => "i64",
        AlgebraicType::U128 => "u128",
        AlgebraicType::I128 => "i128",
        AlgebraicType::U256 | AlgebraicType::I256 => "[u8; 32]",
        AlgebraicType::F32 => "f32",
        AlgebraicType::F64 => "f64",
        AlgebraicType::String => "String",
        AlgebraicType::Bytes => "Vec<u8>",
        _ => "AlgebraicValue",
    }
}

// The accessor chained onto `row.field(i)`, yielding an Option.
fn extract_suffix(ty: &AlgebraicType) -> &'static str {
    match ty {
        AlgebraicType::Bool => ".and_then(AlgebraicValue::as_bool)",
        AlgebraicType::U8 => ".and_then(AlgebraicValue::as_u8)",
        AlgebraicType::I8 => ".and_then(AlgebraicValue::as_i8)",
        AlgebraicType::U16 => ".and_then(AlgebraicValue::as_u16)",
        AlgebraicType::I16 => ".and_then(AlgebraicValue::as_i16)",
        AlgebraicType::U32 => ".and_then(AlgebraicValue::as_u32)",
        AlgebraicType::I32 => ".and_then(AlgebraicValue::as_i32)",
        AlgebraicType::U64 => ".and_then(AlgebraicValue::as_u64)",
        AlgebraicType::I64 => ".and_then(AlgebraicValue::as_i64)",
        AlgebraicType::U128 => ".and_then(AlgebraicValue::as_u128)",
        AlgebraicType::I128 => ".and_then(AlgebraicValue::as_i128)",
        AlgebraicType::U256 => ".and_then(AlgebraicValue::as_u256)",
        AlgebraicType::I256 => ".and_then(AlgebraicValue::as_i256)",
        AlgebraicType::F32 => ".and_then(AlgebraicValue::as_f32)",
        AlgebraicType::F64 => ".and_then(AlgebraicValue::as_f64)",
        AlgebraicType::String => ".and_then(AlgebraicValue::as_str).map(ToString::to_string)",
        AlgebraicType::Bytes => ".and_then(AlgebraicValue::as_bytes).map(<[u8]>::to_vec)",
        _ => ".cloned()",
    }
}

// Wraps a native parameter back into its wire value.
fn value_expression(ty: &AlgebraicType, name: &str) -> String {
    match ty {
        AlgebraicType::Bool => format!("AlgebraicValue::Bool({name})"),
        AlgebraicType::U8 => format!("AlgebraicValue::U8({name})"),
        AlgebraicType::I8 => format!("AlgebraicValue::I8({name})"),
        AlgebraicType::U16 => format!("AlgebraicValue::U16({name})"),
        AlgebraicType::I16 => format!("AlgebraicValue::I16({name})"),
        AlgebraicType::U32 => format!("AlgebraicValue::U32({name})"),
        AlgebraicType::I32 => format!("AlgebraicValue::I32({name})"),
        AlgebraicType::U64 => format!("AlgebraicValue::U64({name})"),
        AlgebraicType::I64 => format!("AlgebraicValue::I64({name})"),
        AlgebraicType::U128 => format!("AlgebraicValue::U128({name})"),
        AlgebraicType::I128 => format!("AlgebraicValue::I128({name})"),
        AlgebraicType::U256 => format!("AlgebraicValue::U256({name})"),
        AlgebraicType::I256 => format!("AlgebraicValue::I256({name})"),
        AlgebraicType::F32 => format!("AlgebraicValue::F32({name})"),
        AlgebraicType::F64 => format!("AlgebraicValue::F64({name})"),
        AlgebraicType::String => format!("AlgebraicValue::String({name})"),
        AlgebraicType::Bytes => format!("AlgebraicValue::Bytes({name})"),
        _ => name.to_string(),
    }
}

fn field_name(column: &Column, index: usize) -> String {
    match &column.name {
        Some(name) => snake_case(name),
        None => format!("field_{index}"),
    }
}

fn pascal_case(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (index, character) in name.chars().enumerate() {
        if character.is_uppercase() {
            if index > 0 {
                out.push('_');
            }
            out.extend(character.to_lowercase());
        } else if character == '-' {
            out.push('_');
        } else {
            out.push(character);
        }
    }
    if RUST_KEYWORDS.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false", "fn",
    "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
    "where", "while",
];
