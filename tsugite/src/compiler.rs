//! Two-pass schema compiler.
//!
//! Pass 1 registers declared type names and rejects duplicates inside
//! a module. Pass 2 walks each parsed type and emits an `Arc<Codec>`,
//! recursing into members, elements and alternatives. References
//! resolve against the current module's already-compiled types first
//! and the global table second, so a forward reference inside a module
//! fails rather than compiling unresolved; a reference back into the
//! type currently being compiled is reported as a cycle.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use ber::codec::{
    Alternative, BooleanCodec, ChoiceCodec, Codec, Constraint, EnumeratedCodec, IntegerCodec,
    Member, NullCodec, OctetStringCodec, SequenceCodec, SequenceOfCodec,
};
use ber::{Tag, Value};
use schema::{ast, Schema};

use crate::error::CompileError;
use crate::{Module, Specification};

pub(crate) fn compile(schema: &Schema) -> Result<Specification, CompileError> {
    // Pass 1: declared names, per module.
    for module in schema.modules() {
        let mut seen = HashSet::new();
        for assignment in &module.assignments {
            if !seen.insert(assignment.name.as_str()) {
                return Err(CompileError::DuplicateDefinition {
                    module: module.name.clone(),
                    name: assignment.name.clone(),
                });
            }
        }
    }

    // Pass 2: emit codecs module by module, feeding the global table
    // as each module completes.
    let mut modules = BTreeMap::new();
    let mut global: HashMap<String, Arc<Codec>> = HashMap::new();
    let mut shadowed: HashSet<String> = HashSet::new();
    for parsed in schema.modules() {
        let types = compile_module(parsed, &global)?;
        for (name, codec) in &types {
            if shadowed.contains(name) {
                continue;
            }
            if global.remove(name).is_some() {
                // The name is ambiguous across modules; neither entry
                // stays reachable through the flat table.
                shadowed.insert(name.clone());
                continue;
            }
            global.insert(name.clone(), codec.clone());
        }
        modules.insert(
            parsed.name.clone(),
            Module {
                name: parsed.name.clone(),
                types,
            },
        );
    }

    Ok(Specification { modules, global })
}

struct Context<'a> {
    module: &'a str,
    compiled: &'a BTreeMap<String, Arc<Codec>>,
    in_progress: &'a HashSet<String>,
    global: &'a HashMap<String, Arc<Codec>>,
}

fn compile_module(
    module: &ast::Module,
    global: &HashMap<String, Arc<Codec>>,
) -> Result<BTreeMap<String, Arc<Codec>>, CompileError> {
    let mut compiled = BTreeMap::new();
    let mut in_progress = HashSet::new();
    for assignment in &module.assignments {
        in_progress.insert(assignment.name.clone());
        let codec = compile_type(
            &Context {
                module: &module.name,
                compiled: &compiled,
                in_progress: &in_progress,
                global,
            },
            &assignment.name,
            &assignment.ty,
        )?;
        in_progress.remove(&assignment.name);
        compiled.insert(assignment.name.clone(), codec);
    }
    Ok(compiled)
}

/// Compile one parsed type. `path` names the codec in errors; inline
/// member and alternative types extend it as `Outer.field`.
fn compile_type(
    ctx: &Context<'_>,
    path: &str,
    ty: &ast::Type,
) -> Result<Arc<Codec>, CompileError> {
    let constraint = ty.constraint.map(convert_constraint);
    let codec = match &ty.kind {
        ast::TypeKind::Integer => Codec::Integer(IntegerCodec {
            name: path.to_string(),
            constraint,
        }),
        ast::TypeKind::Boolean => Codec::Boolean(BooleanCodec {
            name: path.to_string(),
        }),
        ast::TypeKind::OctetString => Codec::OctetString(OctetStringCodec {
            name: path.to_string(),
            constraint,
        }),
        ast::TypeKind::Null => Codec::Null(NullCodec {
            name: path.to_string(),
        }),
        ast::TypeKind::Enumerated(items) => {
            if items.is_empty() {
                return Err(CompileError::EmptyEnumeration {
                    name: path.to_string(),
                });
            }
            // Omitted numbers continue from the previous value,
            // starting at zero.
            let mut values = Vec::with_capacity(items.len());
            let mut next = 0;
            for item in items {
                let number = item.number.unwrap_or(next);
                next = number + 1;
                values.push((item.name.clone(), number));
            }
            Codec::Enumerated(EnumeratedCodec {
                name: path.to_string(),
                values,
            })
        }
        ast::TypeKind::Sequence(members) => {
            let mut compiled = Vec::with_capacity(members.len());
            for member in members {
                let child = compile_type(ctx, &format!("{path}.{}", member.name), &member.ty)?;
                compiled.push(Member {
                    name: member.name.clone(),
                    codec: child,
                    tag: member.tag,
                    optional: member.optional,
                    default: member.default.as_ref().map(convert_default),
                });
            }
            Codec::Sequence(SequenceCodec {
                name: path.to_string(),
                members: compiled,
            })
        }
        ast::TypeKind::SequenceOf(element) => {
            let element = compile_type(ctx, path, element)?;
            Codec::SequenceOf(SequenceOfCodec {
                name: path.to_string(),
                element,
                constraint,
            })
        }
        ast::TypeKind::Choice(alternatives) => {
            let mut compiled = Vec::with_capacity(alternatives.len());
            let mut tags_seen = HashSet::new();
            for alternative in alternatives {
                let child = compile_type(
                    ctx,
                    &format!("{path}.{}", alternative.name),
                    &alternative.ty,
                )?;
                // Dispatch needs distinct tags: the context wrapper for
                // tagged alternatives, the intrinsic tag otherwise.
                let effective = match alternative.tag {
                    Some(number) => Some(Tag::context(true, number)),
                    None => child.tag(),
                };
                if let Some(tag) = effective {
                    if !tags_seen.insert(tag) {
                        return Err(CompileError::DuplicateAlternativeTag {
                            name: path.to_string(),
                            tag: tag.to_string(),
                        });
                    }
                }
                compiled.push(Alternative {
                    name: alternative.name.clone(),
                    codec: child,
                    tag: alternative.tag,
                });
            }
            Codec::Choice(ChoiceCodec {
                name: path.to_string(),
                alternatives: compiled,
            })
        }
        ast::TypeKind::Defined(reference) => {
            if let Some(codec) = ctx.compiled.get(reference) {
                return Ok(codec.clone());
            }
            if let Some(codec) = ctx.global.get(reference) {
                return Ok(codec.clone());
            }
            if ctx.in_progress.contains(reference) {
                return Err(CompileError::CircularReference {
                    module: ctx.module.to_string(),
                    name: reference.clone(),
                });
            }
            return Err(CompileError::UnresolvedReference {
                module: ctx.module.to_string(),
                name: reference.clone(),
            });
        }
    };
    Ok(Arc::new(codec))
}

fn convert_constraint(constraint: ast::Constraint) -> Constraint {
    match constraint {
        ast::Constraint::Size(n) => Constraint::Size(n),
        ast::Constraint::Range(low, high) => Constraint::Range(low, high),
        ast::Constraint::Value(n) => Constraint::Value(n),
    }
}

fn convert_default(value: &ast::DefaultValue) -> Value {
    match value {
        ast::DefaultValue::Number(n) => Value::from(*n),
        ast::DefaultValue::Bool(b) => Value::Boolean(*b),
        ast::DefaultValue::Null => Value::Null,
        ast::DefaultValue::Text(t) => Value::Text(t.clone()),
        ast::DefaultValue::Reference(r) => Value::Text(r.clone()),
    }
}

#[cfg(test)]
mod tests {
    use ber::codec::Codec;
    use schema::ast::{EnumItem, Module, Type, TypeAssignment, TypeKind};
    use schema::Schema;

    use super::compile;
    use crate::error::CompileError;

    fn compile_text(source: &str) -> Result<crate::Specification, CompileError> {
        compile(&Schema::parse(source).unwrap())
    }

    #[test]
    fn test_backward_reference_resolves() {
        let spec = compile_text(
            "Test DEFINITIONS ::= BEGIN
                Id ::= INTEGER
                Frame ::= SEQUENCE { id Id }
             END",
        )
        .unwrap();
        assert!(spec.codec("Frame").is_ok());
    }

    #[test]
    fn test_forward_reference_is_unresolved() {
        let err = compile_text(
            "Test DEFINITIONS ::= BEGIN
                Frame ::= SEQUENCE { id Id }
                Id ::= INTEGER
             END",
        )
        .unwrap_err();
        assert_eq!(
            CompileError::UnresolvedReference {
                module: "Test".to_string(),
                name: "Id".to_string(),
            },
            err
        );
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let err = compile_text(
            "Test DEFINITIONS ::= BEGIN
                Tree ::= SEQUENCE { left Tree }
             END",
        )
        .unwrap_err();
        assert_eq!(
            CompileError::CircularReference {
                module: "Test".to_string(),
                name: "Tree".to_string(),
            },
            err
        );
    }

    #[test]
    fn test_cross_module_reference_resolves() {
        let spec = compile_text(
            "Base DEFINITIONS ::= BEGIN Id ::= INTEGER END
             Uses DEFINITIONS ::= BEGIN Frame ::= SEQUENCE { id Id } END",
        )
        .unwrap();
        assert!(spec.codec("Frame").is_ok());
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let err = compile_text(
            "Test DEFINITIONS ::= BEGIN
                A ::= INTEGER
                A ::= BOOLEAN
             END",
        )
        .unwrap_err();
        assert_eq!(
            CompileError::DuplicateDefinition {
                module: "Test".to_string(),
                name: "A".to_string(),
            },
            err
        );
    }

    #[test]
    fn test_enumerated_auto_numbering() {
        let spec = compile_text(
            "Test DEFINITIONS ::= BEGIN
                Color ::= ENUMERATED { red, green, blue (7), white }
             END",
        )
        .unwrap();
        let codec = spec.codec("Color").unwrap();
        let Codec::Enumerated(e) = codec.as_ref() else {
            panic!("expected ENUMERATED codec");
        };
        let numbers: Vec<i64> = e.values.iter().map(|(_, n)| *n).collect();
        assert_eq!(vec![0, 1, 7, 8], numbers);
    }

    #[test]
    fn test_empty_enumeration_rejected() {
        // The grammar cannot produce this, but hand-built trees can.
        let module = Module {
            name: "Test".to_string(),
            assignments: vec![TypeAssignment {
                name: "Empty".to_string(),
                ty: Type::plain(TypeKind::Enumerated(Vec::<EnumItem>::new())),
            }],
        };
        let err = compile(&Schema::new(vec![module])).unwrap_err();
        assert_eq!(
            CompileError::EmptyEnumeration {
                name: "Empty".to_string(),
            },
            err
        );
    }

    #[test]
    fn test_duplicate_context_tags_rejected() {
        let err = compile_text(
            "Test DEFINITIONS ::= BEGIN
                Msg ::= CHOICE { a [1] INTEGER, b [1] BOOLEAN }
             END",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompileError::DuplicateAlternativeTag { .. }
        ));
    }

    #[test]
    fn test_duplicate_intrinsic_tags_rejected() {
        let err = compile_text(
            "Test DEFINITIONS ::= BEGIN
                Msg ::= CHOICE { a INTEGER, b INTEGER }
             END",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompileError::DuplicateAlternativeTag { .. }
        ));
    }

    #[test]
    fn test_defined_reference_shares_codec() {
        let spec = compile_text(
            "Test DEFINITIONS ::= BEGIN
                Id ::= INTEGER
                Alias ::= Id
             END",
        )
        .unwrap();
        let id = spec.codec("Id").unwrap();
        let alias = spec.codec("Alias").unwrap();
        assert!(std::sync::Arc::ptr_eq(id, alias));
    }
}
