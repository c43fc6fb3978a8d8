//! Recursive-descent compilation engine (spec §4.4).
//!
//! Single pass: tokens are consumed and VM code is emitted directly, with
//! no intermediate AST. The engine owns a class-scope table, a
//! subroutine-scope table (reset per subroutine), a monotonic label
//! counter, the enclosing class name, and a [`VmWriter`].

use std::io::Write;

use crate::error::{JackError, Position, Result};
use crate::symbol_table::{SymbolKind, SymbolTable};
use crate::token::{Token, TokenKind, Tokenizer};
use crate::vm_writer::{segment_for_kind, VmWriter};

const BINARY_OPS: &[char] = &['+', '-', '*', '/', '&', '|', '<', '>', '='];
const KEYWORD_CONSTANTS: &[&str] = &["true", "false", "null", "this"];

pub struct CompilationEngine<W: Write> {
    tokenizer: Tokenizer,
    writer: VmWriter<W>,
    class_table: SymbolTable,
    subroutine_table: SymbolTable,
    class_name: String,
    label_counter: u32,
}

impl<W: Write> CompilationEngine<W> {
    pub fn new(tokenizer: Tokenizer, out: W) -> Self {
        CompilationEngine {
            tokenizer,
            writer: VmWriter::new(out),
            class_table: SymbolTable::new(),
            subroutine_table: SymbolTable::new(),
            class_name: String::new(),
            label_counter: 0,
        }
    }

    /// Compiles every class found in the token stream and returns the
    /// underlying output stream.
    pub fn compile(mut self) -> Result<W> {
        self.tokenizer.advance()?;
        while self.tokenizer.has_more() {
            self.class_table.reset();
            self.subroutine_table.reset();
            self.compile_class()?;
        }
        Ok(self.writer.into_inner())
    }

    // -- token-stream helpers -------------------------------------------------

    fn here(&self) -> Position {
        if self.tokenizer.has_more() {
            self.tokenizer.current().at
        } else {
            Position { line: 0, column: 0 }
        }
    }

    fn peek(&self) -> Result<&Token> {
        if !self.tokenizer.has_more() {
            return Err(JackError::Syntax {
                message: "unexpected end of input".to_string(),
                at: self.here(),
            });
        }
        Ok(self.tokenizer.current())
    }

    fn text(&self) -> Result<&str> {
        Ok(self.peek()?.text.as_str())
    }

    fn advance(&mut self) -> Result<()> {
        self.tokenizer.advance()
    }

    /// Consumes the current token and asserts its text, regardless of kind.
    fn expect(&mut self, expected: &str) -> Result<()> {
        let tok = self.peek()?;
        if tok.text != expected {
            return Err(JackError::Syntax {
                message: format!("expected '{expected}', found '{}'", tok.text),
                at: tok.at,
            });
        }
        self.advance()
    }

    /// Consumes and returns the current token's text, requiring it be an
    /// identifier.
    fn expect_identifier(&mut self) -> Result<String> {
        let tok = self.peek()?;
        if tok.kind != TokenKind::Identifier {
            return Err(JackError::Syntax {
                message: format!("expected identifier, found '{}'", tok.text),
                at: tok.at,
            });
        }
        let name = tok.text.clone();
        self.advance()?;
        Ok(name)
    }

    /// Consumes a type name: `int`, `char`, `boolean`, or a class identifier.
    fn expect_type(&mut self) -> Result<String> {
        let tok = self.peek()?;
        let name = tok.text.clone();
        self.advance()?;
        Ok(name)
    }

    fn fresh_label(&mut self, prefix: &str) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("{prefix}{n}")
    }

    /// Resolves `name` against subroutine scope first, then class scope,
    /// per spec §9's consistency rule.
    fn resolve(&self, name: &str) -> Option<(SymbolKind, u16, String)> {
        if let Some(sym) = self.subroutine_table.get(name) {
            return Some((sym.kind, sym.index, sym.type_name.clone()));
        }
        self.class_table
            .get(name)
            .map(|sym| (sym.kind, sym.index, sym.type_name.clone()))
    }

    fn resolve_required(&self, name: &str) -> Result<(SymbolKind, u16, String)> {
        self.resolve(name).ok_or_else(|| {
            JackError::Semantic(format!("undeclared identifier '{name}'"))
        })
    }

    // -- grammar ---------------------------------------------------------------

    fn compile_class(&mut self) -> Result<()> {
        self.expect("class")?;
        self.class_name = self.expect_identifier()?;
        self.expect("{")?;

        while matches!(self.text()?, "static" | "field") {
            self.compile_class_var_dec()?;
        }

        while matches!(self.text()?, "constructor" | "function" | "method") {
            self.subroutine_table.reset();
            self.compile_subroutine_dec()?;
        }

        self.expect("}")
    }

    fn compile_class_var_dec(&mut self) -> Result<()> {
        let kind = match self.text()? {
            "static" => SymbolKind::Static,
            "field" => SymbolKind::Field,
            other => {
                return Err(JackError::Syntax {
                    message: format!("expected 'static' or 'field', found '{other}'"),
                    at: self.here(),
                })
            }
        };
        self.advance()?;
        let type_name = self.expect_type()?;
        let name = self.expect_identifier()?;
        self.class_table.define(&name, &type_name, kind);

        while self.text()? == "," {
            self.advance()?;
            let name = self.expect_identifier()?;
            self.class_table.define(&name, &type_name, kind);
        }

        self.expect(";")
    }

    fn compile_subroutine_dec(&mut self) -> Result<()> {
        let subroutine_kind = self.text()?.to_string();
        self.advance()?;

        if subroutine_kind == "method" {
            self.subroutine_table
                .define("this", &self.class_name.clone(), SymbolKind::Arg);
        }

        let return_type = self.expect_type()?;
        let name = self.expect_identifier()?;
        let full_name = format!("{}.{}", self.class_name, name);

        self.expect("(")?;
        self.compile_parameter_list()?;
        self.expect(")")?;

        self.compile_subroutine_body(&full_name, &subroutine_kind, &return_type)
    }

    fn compile_parameter_list(&mut self) -> Result<()> {
        if self.text()? == ")" {
            return Ok(());
        }
        let type_name = self.expect_type()?;
        let name = self.expect_identifier()?;
        self.subroutine_table.define(&name, &type_name, SymbolKind::Arg);

        while self.text()? == "," {
            self.advance()?;
            let type_name = self.expect_type()?;
            let name = self.expect_identifier()?;
            self.subroutine_table.define(&name, &type_name, SymbolKind::Arg);
        }
        Ok(())
    }

    fn compile_subroutine_body(
        &mut self,
        full_name: &str,
        subroutine_kind: &str,
        return_type: &str,
    ) -> Result<()> {
        self.expect("{")?;

        while self.text()? == "var" {
            self.compile_var_dec()?;
        }

        let n_locals = self.subroutine_table.count(SymbolKind::Var);
        self.writer.write_function(full_name, n_locals)?;

        match subroutine_kind {
            "method" => {
                self.writer.write_push("argument", 0)?;
                self.writer.write_pop("pointer", 0)?;
            }
            "constructor" => {
                let n_fields = self.class_table.count(SymbolKind::Field);
                self.writer.write_push("constant", n_fields)?;
                self.writer.write_call("Memory.alloc", 1)?;
                self.writer.write_pop("pointer", 0)?;
            }
            _ => {}
        }

        self.compile_statements(return_type)?;
        self.expect("}")
    }

    fn compile_var_dec(&mut self) -> Result<()> {
        self.expect("var")?;
        let type_name = self.expect_type()?;
        let name = self.expect_identifier()?;
        self.subroutine_table.define(&name, &type_name, SymbolKind::Var);

        while self.text()? == "," {
            self.advance()?;
            let name = self.expect_identifier()?;
            self.subroutine_table.define(&name, &type_name, SymbolKind::Var);
        }

        self.expect(";")
    }

    fn compile_statements(&mut self, return_type: &str) -> Result<()> {
        loop {
            match self.text()? {
                "let" => self.compile_let()?,
                "if" => self.compile_if(return_type)?,
                "while" => self.compile_while(return_type)?,
                "do" => self.compile_do()?,
                "return" => self.compile_return(return_type)?,
                _ => return Ok(()),
            }
        }
    }

    fn compile_let(&mut self) -> Result<()> {
        self.expect("let")?;
        let name = self.expect_identifier()?;
        let (kind, index, _ty) = self.resolve_required(&name)?;

        if self.text()? == "[" {
            self.advance()?;
            self.writer.write_push(segment_for_kind(kind), index)?;
            self.compile_expression()?;
            self.expect("]")?;
            self.writer.write_arithmetic("add")?;

            self.expect("=")?;
            self.compile_expression()?;
            self.expect(";")?;

            self.writer.write_pop("temp", 0)?;
            self.writer.write_pop("pointer", 1)?;
            self.writer.write_push("temp", 0)?;
            self.writer.write_pop("that", 0)?;
        } else {
            self.expect("=")?;
            self.compile_expression()?;
            self.expect(";")?;
            self.writer.write_pop(segment_for_kind(kind), index)?;
        }
        Ok(())
    }

    fn compile_if(&mut self, return_type: &str) -> Result<()> {
        self.expect("if")?;
        self.expect("(")?;
        self.compile_expression()?;
        self.expect(")")?;
        self.writer.write_arithmetic("not")?;

        let else_label = self.fresh_label("IF_ELSE");
        let end_label = self.fresh_label("IF_END");

        self.writer.write_if(&else_label)?;
        self.expect("{")?;
        self.compile_statements(return_type)?;
        self.expect("}")?;
        self.writer.write_goto(&end_label)?;

        self.writer.write_label(&else_label)?;
        if self.text()? == "else" {
            self.advance()?;
            self.expect("{")?;
            self.compile_statements(return_type)?;
            self.expect("}")?;
        }
        self.writer.write_label(&end_label)
    }

    fn compile_while(&mut self, return_type: &str) -> Result<()> {
        let start_label = self.fresh_label("WHILE_START");
        let end_label = self.fresh_label("WHILE_END");

        self.writer.write_label(&start_label)?;
        self.expect("while")?;
        self.expect("(")?;
        self.compile_expression()?;
        self.expect(")")?;
        self.writer.write_arithmetic("not")?;
        self.writer.write_if(&end_label)?;

        self.expect("{")?;
        self.compile_statements(return_type)?;
        self.expect("}")?;
        self.writer.write_goto(&start_label)?;
        self.writer.write_label(&end_label)
    }

    fn compile_do(&mut self) -> Result<()> {
        self.expect("do")?;
        self.compile_subroutine_call()?;
        self.expect(";")?;
        self.writer.write_pop("temp", 0)
    }

    /// Compiles `name(args)`, `id.name(args)`, or `Klass.name(args)` and
    /// emits the `call`. Assumes the leading identifier has not yet been
    /// consumed.
    fn compile_subroutine_call(&mut self) -> Result<()> {
        let first = self.expect_identifier()?;

        if self.text()? == "(" {
            self.advance()?;
            self.writer.write_push("pointer", 0)?;
            let n = self.compile_expression_list()?;
            self.expect(")")?;
            self.writer
                .write_call(&format!("{}.{}", self.class_name, first), n + 1)?;
            return Ok(());
        }

        self.expect(".")?;
        let member = self.expect_identifier()?;
        self.expect("(")?;

        if let Some((kind, index, ty)) = self.resolve(&first) {
            self.writer.write_push(segment_for_kind(kind), index)?;
            let n = self.compile_expression_list()?;
            self.expect(")")?;
            self.writer.write_call(&format!("{ty}.{member}"), n + 1)
        } else {
            let n = self.compile_expression_list()?;
            self.expect(")")?;
            self.writer.write_call(&format!("{first}.{member}"), n)
        }
    }

    fn compile_return(&mut self, return_type: &str) -> Result<()> {
        self.expect("return")?;
        if self.text()? != ";" {
            self.compile_expression()?;
        }
        self.expect(";")?;
        if return_type == "void" {
            self.writer.write_push("constant", 0)?;
        }
        self.writer.write_return()
    }

    fn compile_expression(&mut self) -> Result<()> {
        self.compile_term()?;
        loop {
            let tok = self.peek()?;
            if tok.kind != TokenKind::Symbol || tok.text.len() != 1 {
                return Ok(());
            }
            let op = tok.text.chars().next().unwrap();
            if !BINARY_OPS.contains(&op) {
                return Ok(());
            }
            self.advance()?;
            self.compile_term()?;
            self.emit_binary_op(op)?;
        }
    }

    fn emit_binary_op(&mut self, op: char) -> Result<()> {
        match op {
            '+' => self.writer.write_arithmetic("add"),
            '-' => self.writer.write_arithmetic("sub"),
            '*' => self.writer.write_call("Math.multiply", 2),
            '/' => self.writer.write_call("Math.divide", 2),
            '&' => self.writer.write_arithmetic("and"),
            '|' => self.writer.write_arithmetic("or"),
            '<' => self.writer.write_arithmetic("lt"),
            '>' => self.writer.write_arithmetic("gt"),
            '=' => self.writer.write_arithmetic("eq"),
            _ => unreachable!("emit_binary_op called with non-operator"),
        }
    }

    fn compile_term(&mut self) -> Result<()> {
        let tok = self.peek()?.clone();

        match tok.kind {
            TokenKind::IntConst => {
                self.advance()?;
                self.writer.write_push("constant", tok.int_value() as u16)
            }
            TokenKind::StringConst => {
                self.advance()?;
                self.writer.write_push("constant", tok.text.chars().count() as u16)?;
                self.writer.write_call("String.new", 1)?;
                for ch in tok.text.chars() {
                    self.writer.write_push("constant", ch as u16)?;
                    self.writer.write_call("String.appendChar", 2)?;
                }
                Ok(())
            }
            TokenKind::Keyword if KEYWORD_CONSTANTS.contains(&tok.text.as_str()) => {
                self.advance()?;
                match tok.text.as_str() {
                    "true" => {
                        self.writer.write_push("constant", 0)?;
                        self.writer.write_arithmetic("neg")
                    }
                    "false" | "null" => self.writer.write_push("constant", 0),
                    "this" => self.writer.write_push("pointer", 0),
                    _ => unreachable!(),
                }
            }
            TokenKind::Symbol if tok.text == "(" => {
                self.advance()?;
                self.compile_expression()?;
                self.expect(")")
            }
            TokenKind::Symbol if tok.text == "-" => {
                self.advance()?;
                self.compile_term()?;
                self.writer.write_arithmetic("neg")
            }
            TokenKind::Symbol if tok.text == "~" => {
                self.advance()?;
                self.compile_term()?;
                self.writer.write_arithmetic("not")
            }
            TokenKind::Identifier => {
                let name = tok.text.clone();
                self.advance()?;
                match self.text()? {
                    "[" => {
                        let (kind, index, _ty) = self.resolve_required(&name)?;
                        self.advance()?;
                        self.writer.write_push(segment_for_kind(kind), index)?;
                        self.compile_expression()?;
                        self.expect("]")?;
                        self.writer.write_arithmetic("add")?;
                        self.writer.write_pop("pointer", 1)?;
                        self.writer.write_push("that", 0)
                    }
                    "(" => {
                        self.advance()?;
                        self.writer.write_push("pointer", 0)?;
                        let n = self.compile_expression_list()?;
                        self.expect(")")?;
                        self.writer
                            .write_call(&format!("{}.{}", self.class_name, name), n + 1)
                    }
                    "." => {
                        self.advance()?;
                        let member = self.expect_identifier()?;
                        self.expect("(")?;
                        if let Some((kind, index, ty)) = self.resolve(&name) {
                            self.writer.write_push(segment_for_kind(kind), index)?;
                            let n = self.compile_expression_list()?;
                            self.expect(")")?;
                            self.writer.write_call(&format!("{ty}.{member}"), n + 1)
                        } else {
                            let n = self.compile_expression_list()?;
                            self.expect(")")?;
                            self.writer.write_call(&format!("{name}.{member}"), n)
                        }
                    }
                    _ => {
                        let (kind, index, _ty) = self.resolve_required(&name)?;
                        self.writer.write_push(segment_for_kind(kind), index)
                    }
                }
            }
            _ => Err(JackError::Syntax {
                message: format!("unexpected token '{}' in expression", tok.text),
                at: tok.at,
            }),
        }
    }

    fn compile_expression_list(&mut self) -> Result<u16> {
        if self.text()? == ")" {
            return Ok(0);
        }
        let mut n = 1;
        self.compile_expression()?;
        while self.text()? == "," {
            self.advance()?;
            self.compile_expression()?;
            n += 1;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> String {
        let tokenizer = Tokenizer::new(source);
        let engine = CompilationEngine::new(tokenizer, Vec::new());
        let out = engine.compile().expect("compilation should succeed");
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn empty_class_emits_nothing() {
        assert_eq!(compile("class Foo {}"), "");
    }

    #[test]
    fn void_method_with_no_body() {
        let vm = compile("class Foo { method void bar() { return; } }");
        assert_eq!(
            vm,
            "function Foo.bar 0\npush argument 0\npop pointer 0\npush constant 0\nreturn\n"
        );
    }

    #[test]
    fn constructor_allocates_fields() {
        let vm = compile("class P { field int x,y; constructor P new() { return this; } }");
        assert_eq!(
            vm,
            "function P.new 0\npush constant 2\ncall Memory.alloc 1\npop pointer 0\npush pointer 0\nreturn\n"
        );
    }

    #[test]
    fn array_store_ordering() {
        let vm = compile(
            "class Foo { function void bar() { var Array arr; var int i, v; let arr[i] = v; return; } }",
        );
        let expected_fragment = "push local 0\npush local 1\nadd\npush local 2\npop temp 0\npop pointer 1\npush temp 0\npop that 0\n";
        assert!(vm.contains(expected_fragment), "got: {vm}");
    }

    #[test]
    fn comparison_labels_are_unique_and_monotonic() {
        let vm = compile(
            "class Foo { function void bar() { if (true) { } if (true) { } return; } }",
        );
        // fresh_label advances the shared counter once per label, not once
        // per construct: the first `if` consumes 0 and 1, the second 2 and 3.
        assert!(vm.contains("IF_ELSE0"));
        assert!(vm.contains("IF_END1"));
        assert!(vm.contains("IF_ELSE2"));
        assert!(vm.contains("IF_END3"));
    }

    #[test]
    fn do_call_on_bare_name_treats_as_this_dot_name() {
        let vm = compile(
            "class Foo { method void bar() { do baz(1); return; } method void baz(int a) { return; } }",
        );
        assert!(vm.contains("push pointer 0\npush constant 1\ncall Foo.baz 2\npop temp 0"));
    }

    #[test]
    fn undeclared_identifier_is_semantic_error() {
        let tokenizer = Tokenizer::new("class Foo { function void bar() { let x = 1; return; } }");
        let engine = CompilationEngine::new(tokenizer, Vec::new());
        let err = engine.compile().unwrap_err();
        assert!(matches!(err, JackError::Semantic(_)));
    }

    #[test]
    fn string_constant_compiles_to_new_and_append_char() {
        let vm = compile("class Foo { function void bar() { do Foo.use(\"ab\"); return; } }");
        assert!(vm.contains("push constant 2\ncall String.new 1"));
        assert!(vm.contains("push constant 97\ncall String.appendChar 2"));
        assert!(vm.contains("push constant 98\ncall String.appendChar 2"));
    }
}
