//! The `!++` directive.
//!
//! Concatenates a sequence of operands that are all mappings or all
//! sequences. Mappings are unioned left to right with later keys winning;
//! sequences are appended in order.

use crate::construct::{insert_in_place, is_directive};
use crate::directive::DirectiveTag;
use crate::node::{Node, NodeKind};
use crate::resolver::ResolveContext;
use crate::{Error, Result, SourceInfo};
use yaml_rust2::Yaml;
use yaml_rust2::yaml::Hash;

enum Accumulated {
    Mapping(Hash),
    Sequence(Vec<Yaml>),
}

impl Accumulated {
    fn kind_name(&self) -> &'static str {
        match self {
            Accumulated::Mapping(_) => "mappings",
            Accumulated::Sequence(_) => "sequences",
        }
    }
}

/// Directive handler for `!++`.
///
/// # Errors
///
/// Returns [`Error::DirectiveArgument`] if the tagged node is not a
/// sequence, and [`Error::ConcatType`] for an empty operand list, an operand
/// that is neither a mapping nor a sequence, or operands of mixed kinds.
pub fn concat(ctx: &mut ResolveContext<'_>, node: &Node) -> Result<Yaml> {
    let Some(operands) = node.as_sequence() else {
        return Err(Error::DirectiveArgument {
            tag: DirectiveTag::Concat.as_str().to_string(),
            message: format!("expected a sequence of operands, found {}", node.kind_name()),
            location: Some(node.source_info.clone()),
        });
    };

    let mut accumulated: Option<Accumulated> = None;
    for operand in operands {
        let value = match &operand.kind {
            _ if is_directive(operand) => ctx.construct(operand)?,
            NodeKind::Mapping(_) | NodeKind::Sequence(_) => ctx.construct(operand)?,
            NodeKind::Scalar { .. } => {
                return Err(type_error(
                    "operands must be mappings or sequences, found a scalar",
                    &operand.source_info,
                ));
            }
        };

        accumulated = Some(match (accumulated, value) {
            (None, Yaml::Hash(hash)) => Accumulated::Mapping(hash),
            (None, Yaml::Array(items)) => Accumulated::Sequence(items),
            (Some(Accumulated::Mapping(mut acc)), Yaml::Hash(hash)) => {
                for (key, value) in hash {
                    insert_in_place(&mut acc, key, value);
                }
                Accumulated::Mapping(acc)
            }
            (Some(Accumulated::Sequence(mut acc)), Yaml::Array(items)) => {
                acc.extend(items);
                Accumulated::Sequence(acc)
            }
            (Some(acc), Yaml::Hash(_) | Yaml::Array(_)) => {
                return Err(type_error(
                    format!(
                        "cannot mix {} with {}",
                        acc.kind_name(),
                        operand_kind(operand, "a mapping or sequence")
                    ),
                    &operand.source_info,
                ));
            }
            (_, _) => {
                return Err(type_error(
                    "operands must be mappings or sequences, found a scalar value",
                    &operand.source_info,
                ));
            }
        });
    }

    match accumulated {
        Some(Accumulated::Mapping(hash)) => Ok(Yaml::Hash(hash)),
        Some(Accumulated::Sequence(items)) => Ok(Yaml::Array(items)),
        None => Err(type_error(
            "needs at least one mapping or sequence operand",
            &node.source_info,
        )),
    }
}

fn operand_kind(operand: &Node, imported: &'static str) -> &'static str {
    if is_directive(operand) {
        imported
    } else {
        operand.kind_name()
    }
}

fn type_error(message: impl Into<String>, source_info: &SourceInfo) -> Error {
    Error::ConcatType {
        message: message.into(),
        location: Some(source_info.clone()),
    }
}
