//! dynexpr_diagnostics: Error messages and the parse error type.
//!
//! Every failure raised while lexing, parsing or type-checking an expression
//! is a [`ParseError`] built from one of the [`messages`] templates. A parse
//! stops at the first error; there is no recovery.

use dynexpr_core::text::{TextPos, TextSpan};
use std::fmt;

/// The phase that rejected the expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad character or unterminated string literal.
    Lexical,
    /// Unexpected or missing token.
    Syntax,
    /// Well-formed text that does not type-check.
    Semantic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "lexical error"),
            ErrorKind::Syntax => write!(f, "syntax error"),
            ErrorKind::Semantic => write!(f, "semantic error"),
        }
    }
}

/// A message template with a code and the phase it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticMessage {
    /// The error code (1xxx lexical, 2xxx syntax, 3xxx semantic).
    pub code: u32,
    pub kind: ErrorKind,
    /// The message template. May contain `{0}`, `{1}` placeholders.
    pub message: &'static str,
}

/// A failed parse: what went wrong and where.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (at index {offset})")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub code: u32,
    pub message: String,
    /// Zero-based character offset into the expression text.
    pub offset: TextPos,
}

impl ParseError {
    pub fn new(template: &DiagnosticMessage, offset: TextPos, args: &[&str]) -> Self {
        Self {
            kind: template.kind,
            code: template.code,
            message: format_message(template.message, args),
            offset,
        }
    }

    /// The span to highlight when rendering this error against its source.
    pub fn span(&self) -> TextSpan {
        TextSpan::new(self.offset, 1)
    }

    pub fn is(&self, template: &DiagnosticMessage) -> bool {
        self.code == template.code
    }
}

/// Format a message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

// ============================================================================
// Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Lexical, $msg:expr) => {
            DiagnosticMessage { code: $code, kind: ErrorKind::Lexical, message: $msg }
        };
        ($code:expr, Syntax, $msg:expr) => {
            DiagnosticMessage { code: $code, kind: ErrorKind::Syntax, message: $msg }
        };
        ($code:expr, Semantic, $msg:expr) => {
            DiagnosticMessage { code: $code, kind: ErrorKind::Semantic, message: $msg }
        };
    }

    // ========================================================================
    // Scanner errors (1000-1099)
    // ========================================================================
    pub const UNTERMINATED_STRING_LITERAL: DiagnosticMessage = diag!(1001, Lexical, "Unterminated string literal");
    pub const INVALID_CHARACTER: DiagnosticMessage = diag!(1002, Lexical, "Syntax error '{0}'");
    pub const DIGIT_EXPECTED: DiagnosticMessage = diag!(1003, Lexical, "Digit expected");

    // ========================================================================
    // Parser errors (2000-2099)
    // ========================================================================
    pub const SYNTAX_ERROR: DiagnosticMessage = diag!(2001, Syntax, "Syntax error");
    pub const EXPRESSION_EXPECTED: DiagnosticMessage = diag!(2002, Syntax, "Expression expected");
    pub const IDENTIFIER_EXPECTED: DiagnosticMessage = diag!(2003, Syntax, "Identifier expected");
    pub const OPEN_PAREN_EXPECTED: DiagnosticMessage = diag!(2004, Syntax, "'(' expected");
    pub const CLOSE_PAREN_OR_OPERATOR_EXPECTED: DiagnosticMessage = diag!(2005, Syntax, "')' or operator expected");
    pub const CLOSE_PAREN_OR_COMMA_EXPECTED: DiagnosticMessage = diag!(2006, Syntax, "')' or ',' expected");
    pub const CLOSE_BRACKET_OR_COMMA_EXPECTED: DiagnosticMessage = diag!(2007, Syntax, "']' or ',' expected");
    pub const COLON_EXPECTED: DiagnosticMessage = diag!(2008, Syntax, "':' expected");
    pub const DOT_OR_OPEN_PAREN_EXPECTED: DiagnosticMessage = diag!(2009, Syntax, "'.' or '(' expected");
    pub const INVALID_INTEGER_LITERAL: DiagnosticMessage = diag!(2010, Syntax, "Invalid integer literal '{0}'");
    pub const INVALID_REAL_LITERAL: DiagnosticMessage = diag!(2011, Syntax, "Invalid real literal '{0}'");
    pub const INVALID_CHARACTER_LITERAL: DiagnosticMessage = diag!(2012, Syntax, "Character literal must contain exactly one character");
    pub const MISSING_AS_CLAUSE: DiagnosticMessage = diag!(2013, Syntax, "Expression is missing an 'as' clause");
    pub const NESTING_TOO_DEEP: DiagnosticMessage = diag!(2014, Syntax, "Expression nesting exceeds the maximum depth of {0}");

    // ========================================================================
    // Type-checking errors (3000-3099)
    // ========================================================================
    pub const DUPLICATE_IDENTIFIER: DiagnosticMessage = diag!(3001, Semantic, "The identifier '{0}' was defined more than once");
    pub const UNKNOWN_IDENTIFIER: DiagnosticMessage = diag!(3002, Semantic, "Unknown identifier '{0}'");
    pub const NO_IT_IN_SCOPE: DiagnosticMessage = diag!(3003, Semantic, "No 'it' is in scope");
    pub const EXPRESSION_TYPE_MISMATCH: DiagnosticMessage = diag!(3004, Semantic, "Expression of type '{0}' expected");
    pub const INCOMPATIBLE_OPERAND: DiagnosticMessage = diag!(3005, Semantic, "Operator '{0}' incompatible with operand type '{1}'");
    pub const INCOMPATIBLE_OPERANDS: DiagnosticMessage = diag!(3006, Semantic, "Operator '{0}' incompatible with operand types '{1}' and '{2}'");
    pub const FIRST_EXPR_MUST_BE_BOOL: DiagnosticMessage = diag!(3007, Semantic, "The first expression must be of type 'Boolean'");
    pub const BOTH_TYPES_CONVERT_TO_OTHER: DiagnosticMessage = diag!(3008, Semantic, "Both of the types '{0}' and '{1}' convert to the other");
    pub const NEITHER_TYPE_CONVERTS_TO_OTHER: DiagnosticMessage = diag!(3009, Semantic, "Neither of the types '{0}' and '{1}' converts to the other");
    pub const IIF_REQUIRES_THREE_ARGS: DiagnosticMessage = diag!(3010, Semantic, "The 'iif' function requires three arguments");
    pub const ARGS_INCOMPATIBLE_WITH_LAMBDA: DiagnosticMessage = diag!(3011, Semantic, "Argument list incompatible with lambda expression");
    pub const TYPE_HAS_NO_NULLABLE_FORM: DiagnosticMessage = diag!(3012, Semantic, "Type '{0}' has no nullable form");
    pub const NO_MATCHING_CONSTRUCTOR: DiagnosticMessage = diag!(3013, Semantic, "No matching constructor in type '{0}'");
    pub const AMBIGUOUS_CONSTRUCTOR_INVOCATION: DiagnosticMessage = diag!(3014, Semantic, "Ambiguous invocation of '{0}' constructor");
    pub const CANNOT_CONVERT_VALUE: DiagnosticMessage = diag!(3015, Semantic, "A value of type '{0}' cannot be converted to type '{1}'");
    pub const UNKNOWN_PROPERTY_OR_FIELD: DiagnosticMessage = diag!(3016, Semantic, "No property or field '{0}' exists in type '{1}'");
    pub const NO_APPLICABLE_METHOD: DiagnosticMessage = diag!(3017, Semantic, "No applicable method '{0}' exists in type '{1}'");
    pub const METHODS_ARE_INACCESSIBLE: DiagnosticMessage = diag!(3018, Semantic, "Methods on type '{0}' are not accessible");
    pub const METHOD_IS_VOID: DiagnosticMessage = diag!(3019, Semantic, "Method '{0}' in type '{1}' does not return a value");
    pub const AMBIGUOUS_METHOD_INVOCATION: DiagnosticMessage = diag!(3020, Semantic, "Ambiguous invocation of method '{0}' in type '{1}'");
    pub const NO_APPLICABLE_AGGREGATE: DiagnosticMessage = diag!(3021, Semantic, "No applicable aggregate method '{0}' exists");
    pub const CANNOT_INDEX_MULTI_DIM_ARRAY: DiagnosticMessage = diag!(3022, Semantic, "Indexing of multi-dimensional arrays is not supported");
    pub const INVALID_INDEX: DiagnosticMessage = diag!(3023, Semantic, "Array index must be an integer expression");
    pub const NO_APPLICABLE_INDEXER: DiagnosticMessage = diag!(3024, Semantic, "No applicable indexer exists in type '{0}'");
    pub const AMBIGUOUS_INDEXER_INVOCATION: DiagnosticMessage = diag!(3025, Semantic, "Ambiguous invocation of indexer in type '{0}'");
    pub const INVALID_PROJECTION: DiagnosticMessage = diag!(3026, Semantic, "Invalid projection: {0}");
    pub const NOT_A_VALUE: DiagnosticMessage = diag!(3027, Semantic, "The identifier '{0}' does not refer to a value");
}
