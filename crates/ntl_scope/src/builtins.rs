//! The closed set of host globals pre-declared in the root scope.
//!
//! References to these names never produce an undeclared diagnostic.

pub const GLOBALS: &[&str] = &[
    // Core objects
    "console", "Math", "JSON", "Object", "Array", "String", "Number",
    "Boolean", "Symbol", "BigInt", "Function", "Promise", "Date", "Error",
    "TypeError", "RangeError", "SyntaxError", "RegExp", "Map", "Set",
    "WeakMap", "WeakSet", "Proxy", "Reflect", "Intl", "WebAssembly",
    // Typed arrays and buffers
    "ArrayBuffer", "SharedArrayBuffer", "DataView", "Atomics", "Int8Array",
    "Uint8Array", "Uint8ClampedArray", "Int16Array", "Uint16Array",
    "Int32Array", "Uint32Array", "Float32Array", "Float64Array",
    "BigInt64Array", "BigUint64Array",
    // Values and conversion helpers
    "Infinity", "NaN", "globalThis", "parseInt", "parseFloat", "isNaN",
    "isFinite", "decodeURIComponent", "encodeURIComponent", "decodeURI",
    "encodeURI", "structuredClone",
    // Host environment
    "require", "module", "exports", "process", "Buffer", "__dirname",
    "__filename", "fetch", "URL", "URLSearchParams", "TextEncoder",
    "TextDecoder", "AbortController", "performance",
    // Timers and scheduling
    "setTimeout", "setInterval", "setImmediate", "clearTimeout",
    "clearInterval", "clearImmediate", "queueMicrotask",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_usual_suspects_are_present() {
        for name in ["console", "Math", "JSON", "require", "process", "globalThis", "fetch"] {
            assert!(GLOBALS.contains(&name), "missing global {}", name);
        }
    }

    #[test]
    fn no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for name in GLOBALS {
            assert!(seen.insert(name), "duplicate global {}", name);
        }
    }
}
