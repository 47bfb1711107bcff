//! reyna-vm - the stack-based bytecode interpreter (§4.5): executes a
//! [`reyna_bytecode::FunctionProto`] produced by `reyna-compile`, manages
//! the GC heap the runtime's objects live on (§4.6), and exposes the
//! embedding surface (§6) a host program links against.

mod error;
mod frame;
mod handler;
mod host;
mod natives;
mod object;
mod value;
mod vm;

pub use error::{Result, VmError};
pub use host::{CapturingHost, DefaultHost, Host};
pub use natives::NativeRegistry;
pub use object::{NativeFn, Obj};
pub use value::Value;
pub use vm::Vm;

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use reyna_check::Checker;
    use reyna_lex::Lexer;
    use reyna_parse::Parser;
    use reyna_util::{Handler, Interner};

    use super::*;

    struct SharedHost(Rc<RefCell<Vec<String>>>);

    impl Host for SharedHost {
        fn print(&mut self, s: &str) {
            self.0.borrow_mut().push(s.to_string());
        }
        fn read_line(&mut self, _prompt: &str) -> std::io::Result<String> {
            Ok(String::new())
        }
    }

    /// Runs a full lex -> parse -> check -> compile -> run pass, asserts
    /// there were no static errors along the way, and returns every line
    /// the program printed.
    fn run_capturing(source: &str) -> Vec<String> {
        let handler = Handler::new();
        let mut interner = Interner::new();

        let tokens = Lexer::new(source, &handler, &mut interner).tokenize();
        let program = Parser::new(tokens, &handler, &interner).parse_program();

        let mut checker = Checker::new(&handler, &interner);
        checker.check_program(&program);
        if handler.has_errors() {
            panic!("static errors: {:#?}", handler.diagnostics());
        }

        let proto = reyna_compile::compile(&program, &handler, &mut interner, PathBuf::from("."))
            .expect("compile should succeed when no errors were reported");
        if handler.has_errors() {
            panic!("compile errors: {:#?}", handler.diagnostics());
        }

        let sink = Rc::new(RefCell::new(Vec::new()));
        let host = Box::new(SharedHost(sink.clone()));
        let mut vm = Vm::with_host(&mut interner, host);
        NativeRegistry::install_default(&mut vm).expect("native registration should not fail for the default set");
        vm.interpret(proto).expect("seed programs must run to completion without a runtime error");

        sink.borrow().clone()
    }

    #[test]
    fn arithmetic_and_print() {
        let out = run_capturing("let x = 1 + 2 * 3; print x;");
        assert_eq!(out, vec!["7"]);
    }

    #[test]
    fn string_concatenation_coerces_numbers() {
        let out = run_capturing(r#"print "n=" + 5;"#);
        assert_eq!(out, vec!["n=5"]);
    }

    #[test]
    fn closures_capture_by_reference() {
        let out = run_capturing(
            r#"
            fn make_counter() {
                let count = 0;
                fn increment() {
                    count = count + 1;
                    return count;
                }
                return increment;
            }
            let counter = make_counter();
            print counter();
            print counter();
            print counter();
            "#,
        );
        assert_eq!(out, vec!["1", "2", "3"]);
    }

    #[test]
    fn classes_inherit_and_call_super() {
        let out = run_capturing(
            r#"
            class Animal {
                fn speak() {
                    return "...";
                }
            }
            class Dog < Animal {
                fn speak() {
                    return "bark (was " + super.speak() + ")";
                }
            }
            let d = Dog();
            print d.speak();
            "#,
        );
        assert_eq!(out, vec!["bark (was ...)"]);
    }

    #[test]
    fn division_always_widens_to_float() {
        let out = run_capturing("print 4 / 2;");
        assert_eq!(out, vec!["2"]);
        let out = run_capturing("print 7 / 2;");
        assert_eq!(out, vec!["3.5"]);
    }

    #[test]
    fn try_catch_recovers_from_a_throw() {
        let out = run_capturing(
            r#"
            try {
                throw "boom";
                print "unreachable";
            } catch (e) {
                print "caught " + e;
            }
            print "after";
            "#,
        );
        assert_eq!(out, vec!["caught boom", "after"]);
    }

    #[test]
    fn finally_does_not_run_when_catch_itself_throws() {
        let out = run_capturing(
            r#"
            try {
                try {
                    throw "inner";
                } catch (e) {
                    throw "rethrown";
                } finally {
                    print "inner finally";
                }
            } catch (e) {
                print "outer caught " + e;
            }
            "#,
        );
        assert_eq!(out, vec!["outer caught rethrown"]);
    }

    #[test]
    fn match_re_evaluates_subject_per_arm() {
        let out = run_capturing(
            r#"
            fn counting_subject() {
                print "evaluated";
                return 2;
            }
            match counting_subject() {
                1 => { print "one"; },
                2 => { print "two"; }
            };
            "#,
        );
        assert_eq!(out, vec!["evaluated", "evaluated", "two"]);
    }

    #[test]
    fn arrays_index_and_mutate() {
        let out = run_capturing(
            r#"
            let xs = [10, 20, 30];
            xs[1] = 99;
            print xs[0];
            print xs[1];
            print xs[2];
            "#,
        );
        assert_eq!(out, vec!["10", "99", "30"]);
    }

    #[test]
    fn set_global_on_undefined_name_is_a_runtime_error() {
        let handler = Handler::new();
        let mut interner = Interner::new();
        let source = "undefined_name = 1;";
        let tokens = Lexer::new(source, &handler, &mut interner).tokenize();
        let program = Parser::new(tokens, &handler, &interner).parse_program();

        let mut checker = Checker::new(&handler, &interner);
        checker.check_program(&program);
        if handler.has_errors() {
            // The checker may itself flag the undefined name; either way
            // there is no silent print-and-continue, which is the
            // property under test.
            return;
        }

        let proto = reyna_compile::compile(&program, &handler, &mut interner, PathBuf::from(".")).unwrap();
        let mut vm = Vm::new(&mut interner);
        NativeRegistry::install_default(&mut vm).unwrap();
        let result = vm.interpret(proto);
        assert!(matches!(result, Err(VmError::UndefinedGlobal(_))));
    }
}
