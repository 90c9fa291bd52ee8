//! Facet scoping for composite predicates.
//!
//! A predicate over the composite Model is cut down to the parts one facet
//! can answer on its own. `&&`/`||` keep whichever branches survive; any
//! other node survives only when all of its children do.
use crate::{
    expr::{BinaryOp, Expr, Lambda, Method, Param},
    model::SchemaModel,
};

///
/// Pruner
///

struct Pruner {
    outer: Param,
    facet: Param,
    field: &'static str,
    many: bool,
}

/// Scope `global` to the facet stored in composite field `field`.
///
/// The result is a predicate over the facet Model. When nothing in
/// `global` concerns the facet the result is the constant `true`.
pub(super) fn scope(
    global: &Lambda,
    field: &'static str,
    schema: &'static SchemaModel,
    many: bool,
) -> Lambda {
    let pruner = Pruner {
        outer: global.param,
        facet: Param::new(global.param.name, schema),
        field,
        many,
    };

    match pruner.prune(&global.body) {
        Some(body) => Lambda {
            param: pruner.facet,
            body,
        },
        None => Lambda::constant(pruner.facet, true),
    }
}

impl Pruner {
    fn prune(&self, expr: &Expr) -> Option<Expr> {
        // constants and captured values
        if !expr.references(&self.outer) {
            return Some(expr.clone());
        }

        match expr {
            Expr::Parameter(_) | Expr::Lambda(_) => None,
            Expr::Field { .. } => self.field(expr),
            Expr::Binary { op, left, right } if op.is_logical() => {
                match (self.prune(left), self.prune(right)) {
                    (Some(left), Some(right)) => Some(binary(*op, left, right)),
                    (Some(side), None) | (None, Some(side)) => Some(side),
                    (None, None) => None,
                }
            }
            Expr::Binary { op, left, right } => {
                Some(binary(*op, self.prune(left)?, self.prune(right)?))
            }
            Expr::Unary { op, operand } => {
                // conversion wrappers around a facet field are dropped with the chain
                if op.is_conversion() && expr.field_chain(&self.outer).is_some() {
                    return self.field(expr);
                }

                Some(Expr::Unary {
                    op: *op,
                    operand: Box::new(self.prune(operand)?),
                })
            }
            Expr::Call {
                method: Method::Any,
                target,
                args,
            } => self.any(target, args),
            Expr::Call {
                method,
                target,
                args,
            } => Some(Expr::Call {
                method: *method,
                target: Box::new(self.prune(target)?),
                args: args
                    .iter()
                    .map(|arg| self.prune(arg))
                    .collect::<Option<Vec<_>>>()?,
            }),
            Expr::Constant(_) => Some(expr.clone()),
        }
    }

    // `x.<facet>.<rest..>` on a single-record facet becomes `x.<rest..>`
    fn field(&self, expr: &Expr) -> Option<Expr> {
        if self.many {
            return None;
        }

        let names = expr.field_chain(&self.outer)?;
        match names.split_first() {
            Some((head, rest)) if *head == self.field && !rest.is_empty() => Some(
                rest.iter()
                    .fold(Expr::Parameter(self.facet), |base, name| base.field(*name)),
            ),
            _ => None,
        }
    }

    // `x.<facet>.any(|l| ..)` on a collection facet becomes the lambda body
    // rebound to the facet parameter
    fn any(&self, target: &Expr, args: &[Expr]) -> Option<Expr> {
        if !self.many || target.field_chain(&self.outer)? != [self.field] {
            return None;
        }

        let [Expr::Lambda(lambda)] = args else {
            return None;
        };
        let body = rebind(&lambda.body, lambda.param, self.facet);

        (!body.references(&self.outer)).then_some(body)
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

// replace every free occurrence of `from` with `to`
fn rebind(expr: &Expr, from: Param, to: Param) -> Expr {
    match expr {
        Expr::Parameter(param) if *param == from => Expr::Parameter(to),
        Expr::Parameter(_) | Expr::Constant(_) => expr.clone(),
        Expr::Field { base, name, owner } => Expr::Field {
            base: Box::new(rebind(base, from, to)),
            name: *name,
            owner: *owner,
        },
        Expr::Binary { op, left, right } => {
            binary(*op, rebind(left, from, to), rebind(right, from, to))
        }
        Expr::Unary { op, operand } => Expr::Unary {
            op: *op,
            operand: Box::new(rebind(operand, from, to)),
        },
        Expr::Call {
            method,
            target,
            args,
        } => Expr::Call {
            method: *method,
            target: Box::new(rebind(target, from, to)),
            args: args.iter().map(|arg| rebind(arg, from, to)).collect(),
        },
        Expr::Lambda(lambda) if lambda.param == from => expr.clone(),
        Expr::Lambda(lambda) => Expr::Lambda(Box::new(Lambda {
            param: lambda.param,
            body: rebind(&lambda.body, from, to),
        })),
    }
}
