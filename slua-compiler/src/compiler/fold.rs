use slua_syntax::ast::*;

/// A value known at compile time.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Literal<'a> {
    Nil,
    Boolean(bool),
    Number(f64),
    String(&'a str),
}

impl Literal<'_> {
    fn is_truthy(&self) -> bool {
        !matches!(self, Literal::Nil | Literal::Boolean(false))
    }
}

/// Evaluates `expr` if it is built only from literals and the operators
/// that can be folded: arithmetic on numbers, unary minus, and `not`.
pub fn evaluate(expr: &Expr) -> Option<Literal<'_>> {
    match expr {
        Expr::Nil => Some(Literal::Nil),
        Expr::Boolean(b) => Some(Literal::Boolean(*b)),
        Expr::Number(n) => Some(Literal::Number(*n)),
        Expr::String(s) => Some(Literal::String(s)),
        Expr::Grouping(inner) => evaluate(&inner.value),
        Expr::Unary(operator, right) => {
            let right = evaluate(&right.value)?;
            match (operator.value, right) {
                (UnaryOperator::Minus, Literal::Number(n)) => Some(Literal::Number(-n)),
                (UnaryOperator::Not, value) => Some(Literal::Boolean(!value.is_truthy())),
                _ => None,
            }
        }
        Expr::Binary(left, operator, right) => {
            let (a, b) = match (evaluate(&left.value)?, evaluate(&right.value)?) {
                (Literal::Number(a), Literal::Number(b)) => (a, b),
                _ => return None,
            };
            let value = match operator.value {
                BinaryOperator::Plus => a + b,
                BinaryOperator::Minus => a - b,
                BinaryOperator::Star => a * b,
                BinaryOperator::Slash => a / b,
                BinaryOperator::Percent => a - (a / b).floor() * b,
                BinaryOperator::Caret => a.powf(b),
                _ => return None,
            };
            Some(Literal::Number(value))
        }
        _ => None,
    }
}

/// Only operator expressions are worth replacing; plain literals already
/// compile to a single instruction.
pub fn fold(expr: &Expr) -> Option<Literal<'_>> {
    match expr {
        Expr::Unary(..) | Expr::Binary(..) => evaluate(expr),
        Expr::Grouping(inner) => fold(&inner.value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold_str(code: &str) -> Option<Literal<'static>> {
        let ast = slua_syntax::parse(&format!("x = {}", code)).unwrap();
        match &ast[0].value {
            Stmt::Assign(_, values) => match fold(&values[0].value) {
                Some(Literal::Number(n)) => Some(Literal::Number(n)),
                Some(Literal::Boolean(b)) => Some(Literal::Boolean(b)),
                Some(Literal::Nil) => Some(Literal::Nil),
                Some(Literal::String(_)) | None => None,
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn folds_arithmetic() {
        assert_eq!(fold_str("1 + 2 * 3"), Some(Literal::Number(7.0)));
        assert_eq!(fold_str("(1 + 2) * 3"), Some(Literal::Number(9.0)));
        assert_eq!(fold_str("-2 ^ 2"), Some(Literal::Number(-4.0)));
        assert_eq!(fold_str("2 ^ 3 ^ 2"), Some(Literal::Number(512.0)));
        assert_eq!(fold_str("-5 % 3"), Some(Literal::Number(1.0)));
        assert_eq!(fold_str("7 / 2"), Some(Literal::Number(3.5)));
        assert_eq!(fold_str("-(4)"), Some(Literal::Number(-4.0)));
    }

    #[test]
    fn folds_not() {
        assert_eq!(fold_str("not nil"), Some(Literal::Boolean(true)));
        assert_eq!(fold_str("not 0"), Some(Literal::Boolean(false)));
        assert_eq!(fold_str("not \"\""), Some(Literal::Boolean(false)));
        assert_eq!(fold_str("not not false"), Some(Literal::Boolean(false)));
    }

    #[test]
    fn leaves_the_rest() {
        assert_eq!(fold_str("1"), None);
        assert_eq!(fold_str("a + 1"), None);
        assert_eq!(fold_str("1 .. 2"), None);
        assert_eq!(fold_str("1 < 2"), None);
        assert_eq!(fold_str("-\"a\""), None);
        assert_eq!(fold_str("#\"abc\""), None);
        assert_eq!(fold_str("1 + true"), None);
    }
}
