//! The public entry point: one request string in, one printed result out.

use std::collections::HashMap;

use crate::env::{EnvRef, Envs};
use crate::error::Result;
use crate::eval::Evaluator;
use crate::reader;
use crate::token::Tokenizer;
use crate::value::{Arena, Primitive, SymbolId};

/// Owns every arena the evaluator touches and persists them across calls, so
/// a `define` or `set!` in one request is visible to the next.
pub struct Interpreter {
    arena: Arena,
    envs: Envs,
    root: EnvRef,
    primitives: HashMap<SymbolId, Primitive>,
}

impl Interpreter {
    /// Builds a fresh interpreter with the primitive table bound into a new
    /// root environment. The table is built once, here, rather than read
    /// from a process-wide registry.
    pub fn new() -> Interpreter {
        let mut arena = Arena::new();
        let mut envs = Envs::new();
        let root = envs.root();

        let mut primitives = HashMap::new();
        for prim in Primitive::all() {
            let id = arena.intern(prim.name());
            primitives.insert(id, prim);
        }

        Interpreter {
            arena,
            envs,
            root,
            primitives,
        }
    }

    /// Tokenizes, reads, and evaluates `request` in the persistent root
    /// environment, returning its printed result.
    pub fn run(&mut self, request: &str) -> Result<String> {
        tracing::debug!(request, "evaluating request");
        let mut tokenizer = Tokenizer::new(request)?;
        let datum = reader::read(&mut tokenizer, &mut self.arena)?;

        let mut evaluator = Evaluator {
            arena: &mut self.arena,
            envs: &mut self.envs,
            primitives: &self.primitives,
        };
        let result = evaluator.eval(datum, self.root)?;
        Ok(self.arena.print(result))
    }
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let mut i = Interpreter::new();
        assert_eq!(i.run("(+ 1 2 3)").unwrap(), "6");
        assert_eq!(i.run("(* 2 3 4)").unwrap(), "24");
        assert_eq!(i.run("(- 10 3 2)").unwrap(), "5");
        assert_eq!(i.run("(/ 20 2 2)").unwrap(), "5");
        assert_eq!(i.run("(- 5)").unwrap(), "-5");
    }

    #[test]
    fn division_by_zero_is_runtime_error() {
        let mut i = Interpreter::new();
        assert!(i.run("(/ 1 0)").is_err());
    }

    #[test]
    fn quoting_and_printing() {
        let mut i = Interpreter::new();
        assert_eq!(i.run("(quote (1 2 3))").unwrap(), "(1 2 3)");
        assert_eq!(i.run("'(a . b)").unwrap(), "(a . b)");
        assert_eq!(i.run("'()").unwrap(), "()");
    }

    #[test]
    fn conditionals_and_truthiness() {
        let mut i = Interpreter::new();
        assert_eq!(i.run("(if (> 3 2) 'yes 'no)").unwrap(), "yes");
        assert_eq!(i.run("(if #f 'yes 'no)").unwrap(), "no");
        assert_eq!(i.run("(if 0 'truthy 'falsy)").unwrap(), "truthy");
        assert_eq!(i.run("(if '() 'truthy 'falsy)").unwrap(), "truthy");
        assert_eq!(i.run("(if #f 'unreached)").unwrap(), "()");
    }

    #[test]
    fn define_and_lookup_persist_across_calls() {
        let mut i = Interpreter::new();
        assert_eq!(i.run("(define x 10)").unwrap(), "()");
        assert_eq!(i.run("(+ x 5)").unwrap(), "15");
        assert_eq!(i.run("(set! x 20)").unwrap(), "()");
        assert_eq!(i.run("x").unwrap(), "20");
    }

    #[test]
    fn the_empty_list_is_a_bindable_value() {
        let mut i = Interpreter::new();
        assert_eq!(i.run("(define x '())").unwrap(), "()");
        assert_eq!(i.run("(null? x)").unwrap(), "#t");
        assert_eq!(i.run("(set! x '())").unwrap(), "()");
        assert_eq!(i.run("x").unwrap(), "()");
        assert_eq!(i.run("((lambda (y) (null? y)) '())").unwrap(), "#t");
    }

    #[test]
    fn unbound_symbol_is_name_error() {
        let mut i = Interpreter::new();
        assert!(i.run("never-defined").is_err());
    }

    #[test]
    fn lambda_application_and_closures() {
        let mut i = Interpreter::new();
        assert_eq!(i.run("((lambda (x y) (+ x y)) 3 4)").unwrap(), "7");
        i.run("(define (adder n) (lambda (x) (+ x n)))").unwrap();
        i.run("(define add5 (adder 5))").unwrap();
        assert_eq!(i.run("(add5 10)").unwrap(), "15");
    }

    #[test]
    fn recursive_define_sees_itself() {
        let mut i = Interpreter::new();
        i.run("(define (fact n) (if (= n 0) 1 (* n (fact (- n 1)))))")
            .unwrap();
        assert_eq!(i.run("(fact 5)").unwrap(), "120");
    }

    #[test]
    fn later_redefinition_in_captured_frame_is_visible() {
        // A lambda closing over a frame sees later defines into that same
        // frame, since the capture is a frame reference, not a snapshot.
        let mut i = Interpreter::new();
        i.run("(define (make-counter) (define count 0) (lambda () (set! count (+ count 1)) count))")
            .unwrap();
        i.run("(define next (make-counter))").unwrap();
        assert_eq!(i.run("(next)").unwrap(), "1");
        assert_eq!(i.run("(next)").unwrap(), "2");
        assert_eq!(i.run("(next)").unwrap(), "3");
    }

    #[test]
    fn pair_and_list_operations() {
        let mut i = Interpreter::new();
        assert_eq!(i.run("(cons 1 2)").unwrap(), "(1 . 2)");
        assert_eq!(i.run("(car (cons 1 2))").unwrap(), "1");
        assert_eq!(i.run("(cdr (cons 1 2))").unwrap(), "2");
        assert_eq!(i.run("(list 1 2 3)").unwrap(), "(1 2 3)");
        assert_eq!(i.run("(list-ref (list 1 2 3) 1)").unwrap(), "2");
        assert_eq!(i.run("(list-tail (list 1 2 3) 1)").unwrap(), "(2 3)");
        assert_eq!(i.run("(null? '())").unwrap(), "#t");
        assert_eq!(i.run("(pair? (cons 1 2))").unwrap(), "#t");
        assert_eq!(i.run("(list? (list 1 2))").unwrap(), "#t");
        assert_eq!(i.run("(list? (cons 1 2))").unwrap(), "#f");
    }

    #[test]
    fn list_ref_out_of_range_errors() {
        let mut i = Interpreter::new();
        assert!(i.run("(list-ref (list 1 2) 5)").is_err());
    }

    #[test]
    fn set_car_and_set_cdr_mutate_in_place() {
        let mut i = Interpreter::new();
        i.run("(define p (cons 1 2))").unwrap();
        i.run("(set-car! p 10)").unwrap();
        i.run("(set-cdr! p 20)").unwrap();
        assert_eq!(i.run("p").unwrap(), "(10 . 20)");
    }

    #[test]
    fn boolean_short_circuiting() {
        let mut i = Interpreter::new();
        assert_eq!(i.run("(and 1 2 3)").unwrap(), "3");
        assert_eq!(i.run("(and 1 #f 3)").unwrap(), "#f");
        assert_eq!(i.run("(or #f #f 5)").unwrap(), "5");
        assert_eq!(i.run("(or #f #f)").unwrap(), "#f");
        assert_eq!(i.run("(not #f)").unwrap(), "#t");
    }

    #[test]
    fn wrong_arity_to_special_form_is_syntax_error() {
        let mut i = Interpreter::new();
        assert!(i.run("(if)").is_err());
        assert!(i.run("(quote 1 2)").is_err());
    }

    #[test]
    fn wrong_arity_to_regular_primitive_is_runtime_error() {
        let mut i = Interpreter::new();
        assert!(i.run("(car)").is_err());
        assert!(i.run("(cons 1)").is_err());
    }
}
