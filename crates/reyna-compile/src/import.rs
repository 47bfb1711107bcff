use std::path::Path;

use reyna_lex::Lexer;
use reyna_parse::Parser;

use crate::error::CompileError;
use crate::Compiler;

impl<'a> Compiler<'a> {
    /// Inlines an `import "path";` exactly as if its statements were
    /// textually spliced at this point (§4.4). A process-global
    /// (per-compile) set of visited paths breaks import cycles - a
    /// repeated path is silently skipped rather than re-read, matching
    /// "record visited paths... to break cycles".
    pub(crate) fn compile_import(&mut self, path: &str) {
        if self.visited_imports.contains(path) {
            return;
        }
        self.visited_imports.insert(path.to_string());

        let full_path = self.base_dir.join(path);
        let source = match self.read_import(&full_path) {
            Ok(source) => source,
            Err(err) => {
                self.handler.error(err.to_string(), reyna_util::Span::DUMMY);
                return;
            }
        };

        let tokens = Lexer::new(&source, self.handler, self.interner).tokenize();
        let program = Parser::new(tokens, self.handler, self.interner).parse_program();
        for stmt in &program {
            self.compile_stmt(stmt);
        }
    }

    fn read_import(&self, path: &Path) -> Result<String, CompileError> {
        std::fs::read_to_string(path).map_err(|source| CompileError::ImportRead { path: path.to_path_buf(), source })
    }
}
