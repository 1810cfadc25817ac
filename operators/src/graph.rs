use std::sync::Arc;

use serde_json::Value;

use crate::error::{self, Result};
use crate::gdal_source::{GdalRasterSource, RasterSource};
use crate::image::{BinaryOp, Image};

/// Opens a `RasterSource` for the path named by a `load` node (spec
/// §4.3). Graph evaluation never touches GDAL directly; this is the
/// seam tests substitute to avoid reading real files.
pub trait SourceResolver {
    fn open(&self, path: &str) -> Result<Arc<dyn RasterSource>>;
}

/// The production resolver: opens the path as a GDAL dataset.
pub struct GdalSourceResolver;

impl SourceResolver for GdalSourceResolver {
    fn open(&self, path: &str) -> Result<Arc<dyn RasterSource>> {
        Ok(Arc::new(GdalRasterSource::open(path)?))
    }
}

const OPS: &[&str] = &[
    "load", "constant", "abs", "add", "sub", "mul", "truediv", "floordiv", "lt", "le", "eq", "ne",
    "gt", "ge", "select",
];

/// Recursively builds an `Image` from a call-graph node of the shape
/// `{"name": "<op>", "args": [...]}` (spec §4.3). Arguments that are
/// themselves graph nodes are evaluated first; everything else
/// (numbers, path strings, band-name lists) is taken literally. The
/// dispatch table is exactly the 14 arithmetic/comparison/structural
/// ops plus `load`/`constant`/`select` — an unrecognized `name`
/// surfaces as a client-facing `UnknownOperation`, not a panic.
pub fn eval(value: &Value, resolver: &dyn SourceResolver) -> Result<Image> {
    let object = value.as_object().ok_or_else(|| error::Error::MalformedGraph {
        reason: "call-graph node must be a JSON object".to_string(),
    })?;

    let name = object
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| error::Error::MalformedGraph {
            reason: "call-graph node is missing a string 'name'".to_string(),
        })?;

    if !OPS.contains(&name) {
        return Err(error::Error::UnknownOperation { name: name.to_string() });
    }

    let args = object
        .get("args")
        .and_then(Value::as_array)
        .ok_or_else(|| error::Error::MalformedGraph {
            reason: "call-graph node is missing an 'args' array".to_string(),
        })?;

    match name {
        "load" => {
            let path = arg_str(args, 0)?;
            let source = resolver.open(&path)?;
            Ok(Image::load(path, source))
        }
        "constant" => {
            let value = arg_number(args, 0)?;
            Ok(Image::constant(value))
        }
        "abs" => Ok(eval_nested(args, 0, resolver)?.abs()),
        "select" => {
            let parent = eval_nested(args, 0, resolver)?;
            let bands = arg_string_list(args, 1)?;
            // `select` needs a transformer only for its metadata
            // validation against parent band names; graph construction
            // has no materialize target yet, so a fresh PROJ-backed
            // transformer is fine here (no coordinates are transformed
            // unless bounds actually differ across CRSs).
            let transformer = geoalgebra_datatypes::ProjTransformer::default();
            parent.select(bands, &transformer)
        }
        op_name => {
            let op = binary_op(op_name)?;
            let lhs = eval_nested(args, 0, resolver)?;
            let rhs = eval_operand(args, 1, resolver)?;
            Ok(Image::binary(op, lhs, rhs))
        }
    }
}

/// Converts an `Image` back into the call-graph JSON shape it was (or
/// could have been) built from (spec §8 "round-trip graph eval").
pub fn to_graph(image: &Image) -> Value {
    match image {
        Image::Load(load) => serde_json::json!({ "name": "load", "args": [load.path] }),
        Image::Constant(constant) => serde_json::json!({ "name": "constant", "args": [constant.value] }),
        Image::Abs(parent) => serde_json::json!({ "name": "abs", "args": [to_graph(parent)] }),
        Image::BinaryOp { op, lhs, rhs } => serde_json::json!({
            "name": binary_op_name(*op),
            "args": [to_graph(lhs), to_graph(rhs)],
        }),
        Image::Select { bands, parent } => serde_json::json!({
            "name": "select",
            "args": [to_graph(parent), bands],
        }),
    }
}

fn eval_nested(args: &[Value], index: usize, resolver: &dyn SourceResolver) -> Result<Image> {
    let node = args.get(index).ok_or_else(|| error::Error::MalformedGraph {
        reason: format!("missing argument at index {index}"),
    })?;
    eval(node, resolver)
}

/// A binary operator's right-hand side may be a nested graph node or a
/// bare number (spec §4.2: `image + 5` widens the scalar to a
/// boundless constant).
fn eval_operand(args: &[Value], index: usize, resolver: &dyn SourceResolver) -> Result<Image> {
    let node = args.get(index).ok_or_else(|| error::Error::MalformedGraph {
        reason: format!("missing argument at index {index}"),
    })?;
    if let Some(n) = node.as_f64() {
        Ok(Image::constant(n))
    } else {
        eval(node, resolver)
    }
}

fn arg_str(args: &[Value], index: usize) -> Result<String> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| error::Error::MalformedGraph {
            reason: format!("argument at index {index} must be a string"),
        })
}

fn arg_number(args: &[Value], index: usize) -> Result<f64> {
    args.get(index).and_then(Value::as_f64).ok_or_else(|| error::Error::MalformedGraph {
        reason: format!("argument at index {index} must be a number"),
    })
}

fn arg_string_list(args: &[Value], index: usize) -> Result<Vec<String>> {
    args.get(index)
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .ok_or_else(|| error::Error::MalformedGraph {
            reason: format!("argument at index {index} must be an array of band names"),
        })
}

fn binary_op(name: &str) -> Result<BinaryOp> {
    Ok(match name {
        "add" => BinaryOp::Add,
        "sub" => BinaryOp::Sub,
        "mul" => BinaryOp::Mul,
        "truediv" => BinaryOp::TrueDiv,
        "floordiv" => BinaryOp::FloorDiv,
        "lt" => BinaryOp::Lt,
        "le" => BinaryOp::Le,
        "eq" => BinaryOp::Eq,
        "ne" => BinaryOp::Ne,
        "gt" => BinaryOp::Gt,
        "ge" => BinaryOp::Ge,
        other => return Err(error::Error::UnknownOperation { name: other.to_string() }),
    })
}

fn binary_op_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "sub",
        BinaryOp::Mul => "mul",
        BinaryOp::TrueDiv => "truediv",
        BinaryOp::FloorDiv => "floordiv",
        BinaryOp::Lt => "lt",
        BinaryOp::Le => "le",
        BinaryOp::Eq => "eq",
        BinaryOp::Ne => "ne",
        BinaryOp::Gt => "gt",
        BinaryOp::Ge => "ge",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoSource;
    impl SourceResolver for NoSource {
        fn open(&self, _path: &str) -> Result<Arc<dyn RasterSource>> {
            Err(error::Error::MalformedGraph {
                reason: "no raster sources in this test".to_string(),
            })
        }
    }

    #[test]
    fn evaluates_a_constant_arithmetic_graph() {
        let graph = serde_json::json!({
            "name": "add",
            "args": [
                { "name": "constant", "args": [3] },
                { "name": "constant", "args": [4] },
            ],
        });
        let image = eval(&graph, &NoSource).unwrap();
        assert!(matches!(image, Image::BinaryOp { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn bare_number_operand_widens_to_a_constant() {
        let graph = serde_json::json!({
            "name": "add",
            "args": [{ "name": "constant", "args": [3] }, 5],
        });
        let image = eval(&graph, &NoSource).unwrap();
        match image {
            Image::BinaryOp { rhs, .. } => assert!(matches!(*rhs, Image::Constant(_))),
            _ => panic!("expected a binary op"),
        }
    }

    #[test]
    fn unknown_operation_name_is_rejected() {
        let graph = serde_json::json!({ "name": "frobnicate", "args": [] });
        assert!(matches!(
            eval(&graph, &NoSource),
            Err(error::Error::UnknownOperation { .. })
        ));
    }

    #[test]
    fn round_trips_a_constant_graph() {
        let graph = serde_json::json!({ "name": "constant", "args": [5.0] });
        let image = eval(&graph, &NoSource).unwrap();
        assert_eq!(to_graph(&image), graph);
    }
}
