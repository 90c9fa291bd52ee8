use crate::{
    expr::ast::{BinaryOp, Expr, Lambda, Param, UnaryOp},
    mapping::{MappingError, MappingSet},
    model::FieldType,
};

///
/// Direction
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    ModelToEntity,
    EntityToModel,
}

impl Direction {
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::ModelToEntity => Self::EntityToModel,
            Self::EntityToModel => Self::ModelToEntity,
        }
    }
}

///
/// Scope
///
/// Per-call rewrite context: the lambda parameter being replaced and the
/// parameter replacing it. Threaded explicitly through the rewrite.
///

#[derive(Clone, Copy, Debug)]
struct Scope {
    source: Param,
    target: Param,
}

///
/// Translator
///
/// Purely syntactic rewrite of a lambda from one schema to the other using
/// a mapping table. Holds no per-call state; create one wherever needed.
///

#[derive(Clone, Copy, Debug)]
pub struct Translator<'a> {
    mappings: &'a MappingSet,
    direction: Direction,
}

impl<'a> Translator<'a> {
    #[must_use]
    pub const fn new(mappings: &'a MappingSet, direction: Direction) -> Self {
        Self {
            mappings,
            direction,
        }
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Rewrite `lambda` into the target schema.
    pub fn translate(&self, lambda: &Lambda) -> Result<Lambda, MappingError> {
        let (source, target) = self.mappings.roots(self.direction)?;

        if lambda.param.schema != source {
            return Err(MappingError::ParameterMismatch {
                param: lambda.param.name,
                found: lambda.param.schema.path,
                expected: source.path,
            });
        }

        let scope = Scope {
            source: lambda.param,
            target: Param::new(lambda.param.name, target),
        };
        let body = self.rewrite(&lambda.body, &scope)?;

        tracing::trace!(
            direction = ?self.direction,
            from = %lambda,
            to = %body,
            "translated lambda"
        );

        Ok(Lambda {
            param: scope.target,
            body,
        })
    }

    fn rewrite(&self, expr: &Expr, scope: &Scope) -> Result<Expr, MappingError> {
        // conversions are dropped so the rewritten leaf keeps its own type
        let expr = expr.strip_conversions();

        match expr {
            Expr::Parameter(param) if *param == scope.source => Ok(Expr::Parameter(scope.target)),
            Expr::Parameter(_) | Expr::Constant(_) => Ok(expr.clone()),

            Expr::Field { base, name, .. } => {
                if let Some(names) = expr.field_chain(&scope.source) {
                    let mapping = self.mappings.find(self.direction, &names)?;
                    return Ok(mapping
                        .target(self.direction)
                        .to_expr(Expr::Parameter(scope.target)));
                }

                // not rooted at the lambda parameter: a nested lambda's
                // element or a captured value
                Ok(self.rewrite(base, scope)?.field(name))
            }

            Expr::Binary { op, left, right } => {
                let left = self.rewrite(left, scope)?;
                let right = self.rewrite(right, scope)?;

                Ok(coerce(*op, left, right))
            }

            Expr::Unary { op, operand } => Ok(Expr::Unary {
                op: *op,
                operand: Box::new(self.rewrite(operand, scope)?),
            }),

            Expr::Call {
                method,
                target,
                args,
            } => Ok(Expr::Call {
                method: *method,
                target: Box::new(self.rewrite(target, scope)?),
                args: args
                    .iter()
                    .map(|arg| self.rewrite(arg, scope))
                    .collect::<Result<_, _>>()?,
            }),

            Expr::Lambda(inner) => Ok(Expr::Lambda(Box::new(Lambda {
                param: inner.param,
                body: self.rewrite(&inner.body, scope)?,
            }))),
        }
    }
}

// Rebuild a binary node so both operands agree on type.
//
// A nullable numeric side pulls the other side to nullable; any remaining
// mismatch converts the right side to the left side's type. Numeric sides
// of different kinds keep their kinds, since the evaluator compares them
// across kinds exactly and a kind change could narrow. `Any` is never a
// conversion target.
fn coerce(op: BinaryOp, mut left: Expr, mut right: Expr) -> Expr {
    let (lt, rt) = (left.ty(), right.ty());

    if lt.is_nullable_numeric() && !rt.nullable {
        right = convert(right, nullable_like(lt, rt));
    } else if rt.is_nullable_numeric() && !lt.nullable {
        left = convert(left, nullable_like(rt, lt));
    }

    let (lt, rt) = (left.ty(), right.ty());
    if lt != rt && !(lt.kind.is_numeric() && rt.kind.is_numeric()) {
        if !lt.is_any() {
            right = convert(right, lt);
        } else if !rt.is_any() {
            left = convert(left, rt);
        }
    }

    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

// Target type for the side pulled to nullable by a nullable numeric `pull`.
const fn nullable_like(pull: FieldType, side: FieldType) -> FieldType {
    if side.kind.is_numeric() {
        side.as_nullable()
    } else {
        pull
    }
}

fn convert(expr: Expr, ty: FieldType) -> Expr {
    if expr.ty() == ty || ty.is_any() {
        return expr;
    }

    Expr::Unary {
        op: UnaryOp::Convert(ty),
        operand: Box::new(expr),
    }
}
