//! Translation of host JavaScript engine errors into NTL-shaped diagnostics.
//!
//! The compiled program runs in a host engine whose error messages talk about
//! JavaScript concepts. Before presentation the CLI passes them through here;
//! translation never fails, unrecognized messages pass through verbatim as a
//! runtime-phase diagnostic.

use crate::{codes, Diagnostic, Phase};

/// Translate one host engine error message line.
pub fn translate_host_error(message: &str) -> Diagnostic {
    let message = message.trim();

    if let Some(prop) = property_of_nullish(message) {
        return Diagnostic::error(
            Phase::Runtime,
            format!(
                "Cannot access property '{}' — value is null or undefined",
                prop
            ),
        )
        .with_code(codes::NULL_ACCESS)
        .with_suggestion("Guard the access with ifset or have before using the value")
        .with_suggestion("Use optional chaining: value?.property");
    }

    if let Some(name) = subject_of(message, " is not a function") {
        return Diagnostic::error(
            Phase::Runtime,
            format!("'{}' is not a function", name),
        )
        .with_code(codes::NOT_FUNCTION)
        .with_suggestion("Check the spelling of the call target")
        .with_suggestion("Make sure the value was assigned a function before the call");
    }

    if let Some(name) = subject_of(message, " is not defined") {
        return Diagnostic::error(
            Phase::Runtime,
            format!("'{}' is not defined", name),
        )
        .with_code(codes::UNDEF_VAR)
        .with_suggestion(format!("Declare it first: val {} = ...", name));
    }

    if message.contains("Maximum call stack size exceeded") {
        return Diagnostic::error(
            Phase::Runtime,
            "Stack overflow: a function recursed without a base case",
        )
        .with_code(codes::STACK_OVERFLOW)
        .with_suggestion("Add a terminating condition to the recursive function");
    }

    if message.contains("Assignment to constant variable") {
        return Diagnostic::error(
            Phase::Runtime,
            "Cannot reassign a val binding",
        )
        .with_code(codes::CONST_REASSIGN)
        .with_suggestion("Declare the binding with var instead of val if it must change");
    }

    if message.contains("has already been declared") {
        let name = message
            .split('\'')
            .nth(1)
            .unwrap_or("<name>")
            .to_string();
        return Diagnostic::error(
            Phase::Runtime,
            format!("'{}' is declared twice in the same scope", name),
        )
        .with_code(codes::DUP_DECL)
        .with_suggestion("Rename one of the declarations or reuse the existing binding");
    }

    Diagnostic::error(Phase::Runtime, message.to_string())
}

/// Extract `X` from both host phrasings of a nullish property access:
/// "Cannot read property 'X' of undefined" and
/// "Cannot read properties of undefined (reading 'X')".
fn property_of_nullish(message: &str) -> Option<String> {
    if !message.starts_with("Cannot read propert")
        && !message.starts_with("Cannot set propert")
    {
        return None;
    }
    if !message.contains("of undefined") && !message.contains("of null") {
        return None;
    }
    message
        .split('\'')
        .nth(1)
        .map(str::to_string)
        .or_else(|| Some("<unknown>".to_string()))
}

/// Extract the subject preceding a fixed suffix, e.g. `foo` from
/// "foo is not a function". TypeErrors qualify the subject; strip the prefix.
fn subject_of(message: &str, suffix: &str) -> Option<String> {
    let end = message.find(suffix)?;
    let mut subject = &message[..end];
    for prefix in ["TypeError: ", "ReferenceError: ", "Uncaught "] {
        subject = subject.strip_prefix(prefix).unwrap_or(subject);
    }
    Some(subject.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullish_property_old_phrasing() {
        let d = translate_host_error("Cannot read property 'name' of undefined");
        assert_eq!(d.code, Some(codes::NULL_ACCESS));
        assert!(d.message.contains("'name'"));
    }

    #[test]
    fn nullish_property_new_phrasing() {
        let d = translate_host_error("Cannot read properties of undefined (reading 'length')");
        assert_eq!(d.code, Some(codes::NULL_ACCESS));
        assert!(d.message.contains("'length'"));
    }

    #[test]
    fn not_a_function() {
        let d = translate_host_error("TypeError: fooo is not a function");
        assert_eq!(d.code, Some(codes::NOT_FUNCTION));
        assert!(d.message.contains("'fooo'"));
    }

    #[test]
    fn not_defined() {
        let d = translate_host_error("ReferenceError: bar is not defined");
        assert_eq!(d.code, Some(codes::UNDEF_VAR));
    }

    #[test]
    fn stack_overflow() {
        let d = translate_host_error("RangeError: Maximum call stack size exceeded");
        assert_eq!(d.code, Some(codes::STACK_OVERFLOW));
    }

    #[test]
    fn const_reassignment() {
        let d = translate_host_error("TypeError: Assignment to constant variable.");
        assert_eq!(d.code, Some(codes::CONST_REASSIGN));
    }

    #[test]
    fn unknown_message_passes_through() {
        let d = translate_host_error("something exotic happened");
        assert_eq!(d.phase, Phase::Runtime);
        assert_eq!(d.code, None);
        assert_eq!(d.message, "something exotic happened");
    }
}
