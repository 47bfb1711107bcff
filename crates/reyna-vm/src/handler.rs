/// A saved snapshot enabling structured exception unwinding (§GLOSSARY
/// "Handler"). `TRY_BEGIN` pushes one; `TRY_END` pops it on the
/// straight-line path; `THROW` pops it (and every handler above it) on
/// the exceptional path.
#[derive(Debug, Clone, Copy)]
pub struct ExceptionHandler {
    pub catch_ip: usize,
    pub stack_depth: usize,
    pub frame_depth: usize,
}
