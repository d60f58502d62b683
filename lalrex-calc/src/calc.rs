//! The calculator: a grammar compiled at startup and an evaluator folding
//! the parse event stream.

use crate::error::CalcError;
use crate::symtab::SymTab;
use lalrex::{ParseEvent, SymbolId, SymbolKind, Tables};

/// Statements are either assignments (`name = expr`) or bare expressions.
const GRAMMAR: &str = r#"
    calc {
        %whitespace "[ \t]+";
        %left '+' '-';
        %left '*' '/';
        stmt: name '=' expr [assign] | expr [print];
        expr: expr '+' expr [add]
            | expr '-' expr [sub]
            | expr '*' expr [mul]
            | expr '/' expr [div]
            | '(' expr ')' [group]
            | name [load]
            | number [value];
        name: "[a-z_][a-z_0-9]*";
        number: "[0-9]+";
    }
"#;

/// A calculator bound to its generated tables and a variable store.
pub struct Calc {
    tables: Tables<'static>,
    number_symbol: SymbolId,
    name_symbol: SymbolId,
    pub symtab: SymTab,
}

/// Result of one statement: the value of an expression, or nothing visible
/// for an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    Value(i64),
    Assigned,
}

impl Calc {
    /// Compiles the grammar into tables. The grammar source is a compiled-in
    /// constant, so generation cannot fail unless the crate itself is broken.
    pub fn try_new() -> Result<Self, CalcError> {
        let tables = lalrex::generate(GRAMMAR)?;
        // The alias collapse leaves the regexes as the terminal names.
        let number_symbol = tables
            .find_symbol("[0-9]+", SymbolKind::Terminal)
            .expect("number terminal exists in the grammar");
        let name_symbol = tables
            .find_symbol("[a-z_][a-z_0-9]*", SymbolKind::Terminal)
            .expect("name terminal exists in the grammar");
        Ok(Self {
            tables,
            number_symbol,
            name_symbol,
            symtab: SymTab::new(),
        })
    }

    /// Parses and evaluates one statement.
    pub fn eval(&mut self, input: &str) -> Result<Evaluation, CalcError> {
        let events = self.tables.parse(input)?;
        let mut values: Vec<i64> = Vec::new();
        let mut names: Vec<&str> = Vec::new();
        let mut result = Evaluation::Assigned;

        for event in events {
            match event {
                ParseEvent::Shift { symbol, lexeme } => {
                    if symbol == self.number_symbol {
                        values.push(lexeme.parse::<i64>()?);
                    } else if symbol == self.name_symbol {
                        names.push(lexeme);
                    }
                }
                ParseEvent::Reduce { action, .. } => {
                    let tag = action.unwrap_or("");
                    log::trace!("reduce [{}] values={:?} names={:?}", tag, values, names);
                    match tag {
                        "add" | "sub" | "mul" | "div" => {
                            let rhs = values.pop().ok_or(CalcError::StackUnderflow)?;
                            let lhs = values.pop().ok_or(CalcError::StackUnderflow)?;
                            values.push(match tag {
                                "add" => lhs.wrapping_add(rhs),
                                "sub" => lhs.wrapping_sub(rhs),
                                "mul" => lhs.wrapping_mul(rhs),
                                _ => {
                                    if rhs == 0 {
                                        return Err(CalcError::DivisionByZero);
                                    }
                                    lhs.wrapping_div(rhs)
                                }
                            });
                        }
                        "load" => {
                            let name = names.pop().ok_or(CalcError::StackUnderflow)?;
                            values.push(self.symtab.get(name));
                        }
                        "assign" => {
                            let value = values.pop().ok_or(CalcError::StackUnderflow)?;
                            let name = names.pop().ok_or(CalcError::StackUnderflow)?;
                            self.symtab.set(name, value);
                            result = Evaluation::Assigned;
                        }
                        "print" => {
                            let value = values.pop().ok_or(CalcError::StackUnderflow)?;
                            result = Evaluation::Value(value);
                        }
                        // "value" and "group" leave the stack as is.
                        _ => {}
                    }
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn eval(calc: &mut Calc, input: &str) -> Evaluation {
        calc.eval(input).unwrap()
    }

    #[test]
    fn arithmetic_with_precedence() {
        init_logger();
        let mut calc = Calc::try_new().unwrap();
        assert_eq!(eval(&mut calc, "1 + 2 * 3"), Evaluation::Value(7));
        assert_eq!(eval(&mut calc, "(1 + 2) * 3"), Evaluation::Value(9));
        assert_eq!(eval(&mut calc, "10 - 2 - 3"), Evaluation::Value(5));
        assert_eq!(eval(&mut calc, "100 / 5 / 2"), Evaluation::Value(10));
    }

    #[test]
    fn variables() {
        let mut calc = Calc::try_new().unwrap();
        assert_eq!(eval(&mut calc, "x = 2 + 3"), Evaluation::Assigned);
        assert_eq!(eval(&mut calc, "x * x"), Evaluation::Value(25));
        assert_eq!(eval(&mut calc, "y"), Evaluation::Value(0));
        assert_eq!(eval(&mut calc, "x = x + 1"), Evaluation::Assigned);
        assert_eq!(calc.symtab.get("x"), 6);
    }

    #[test]
    fn division_by_zero_is_reported() {
        let mut calc = Calc::try_new().unwrap();
        assert!(matches!(
            calc.eval("1 / 0"),
            Err(CalcError::DivisionByZero)
        ));
    }

    #[test]
    fn parse_errors_surface() {
        let mut calc = Calc::try_new().unwrap();
        assert!(calc.eval("1 +").is_err());
        assert!(calc.eval("@").is_err());
    }
}
