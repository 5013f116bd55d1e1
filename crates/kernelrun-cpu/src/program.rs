//! Entry-point scanning for host "compilation".
//!
//! The host backend does not execute kernel code, but it still needs the
//! program's link state: which entry points exist and how many parameters
//! each declares. That is recovered with a small scan over the
//! macro-expanded source for `__kernel void name(...)` declarations.

/// One scanned entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryPoint {
    pub(crate) name: String,
    pub(crate) arity: usize,
}

/// Scan `source` for kernel entry-point declarations.
///
/// Returns a build-log-style reason string on failure: a source with no
/// entry point, a non-`void` return type, or an unbalanced parameter list
/// does not link.
pub(crate) fn scan_entry_points(source: &str) -> Result<Vec<EntryPoint>, String> {
    let mut entries = Vec::new();
    let mut rest = source;

    while let Some(pos) = rest.find("__kernel") {
        let after = &rest[pos + "__kernel".len()..];
        let open = after
            .find('(')
            .ok_or_else(|| "missing parameter list after __kernel".to_string())?;
        let header = &after[..open];

        let name = header
            .split_whitespace()
            .last()
            .ok_or_else(|| "missing entry point name after __kernel".to_string())?;
        if !header.split_whitespace().any(|tok| tok == "void") {
            return Err(format!("entry point '{}' must return void", name));
        }

        let params_src = &after[open + 1..];
        let (params, consumed) = take_balanced(params_src)
            .ok_or_else(|| format!("unbalanced parameter list for entry point '{}'", name))?;

        entries.push(EntryPoint {
            name: name.to_string(),
            arity: count_params(params),
        });
        rest = &params_src[consumed..];
    }

    if entries.is_empty() {
        return Err("source defines no __kernel entry point".to_string());
    }
    Ok(entries)
}

/// Take the text up to the parenthesis closing an already-opened group.
///
/// Returns the inner text and the byte offset just past the closing
/// parenthesis, or `None` if the group never closes.
fn take_balanced(src: &str) -> Option<(&str, usize)> {
    let mut depth = 1usize;
    for (i, c) in src.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&src[..i], i + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Count declared parameters: top-level commas plus one, with an empty or
/// `void` parameter list counting as zero.
fn count_params(params: &str) -> usize {
    let mut depth = 0usize;
    let mut count = 1usize;
    for c in params.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => count += 1,
            _ => {}
        }
    }
    let trimmed = params.trim();
    if count == 1 && (trimmed.is_empty() || trimmed == "void") {
        0
    } else {
        count
    }
}

/// Render a build log listing the scanned entry points.
pub(crate) fn render_build_log(entries: &[EntryPoint]) -> String {
    let mut log = format!("entry points: {}\n", entries.len());
    for e in entries {
        log.push_str(&format!("  {}({})\n", e.name, e.arity));
    }
    log
}

/// Render the per-device "binary" artifact: an entry-point manifest plus
/// the expanded source, as bytes.
pub(crate) fn render_binary(entries: &[EntryPoint], source: &str, device: usize) -> Vec<u8> {
    let manifest = entries
        .iter()
        .map(|e| format!("{}/{}", e.name, e.arity))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "// kernelrun host program image\n// device: host-{}\n// entry points: {}\n{}",
        device, manifest, source
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_single_kernel() {
        let src = "__kernel void vecadd(__global const float* a, __global const float* b, __global float* c) {}";
        let entries = scan_entry_points(src).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "vecadd");
        assert_eq!(entries[0].arity, 3);
    }

    #[test]
    fn test_scan_multiple_kernels() {
        let src = r#"
            __kernel void scale(__global float* data, float factor) { }
            __kernel void zero(__global float* data) { }
        "#;
        let entries = scan_entry_points(src).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "scale");
        assert_eq!(entries[0].arity, 2);
        assert_eq!(entries[1].name, "zero");
        assert_eq!(entries[1].arity, 1);
    }

    #[test]
    fn test_scan_zero_arity() {
        let entries = scan_entry_points("__kernel void noop() {}").unwrap();
        assert_eq!(entries[0].arity, 0);
        let entries = scan_entry_points("__kernel void noop(void) {}").unwrap();
        assert_eq!(entries[0].arity, 0);
    }

    #[test]
    fn test_scan_no_entry_point() {
        let err = scan_entry_points("float helper(float x) { return x; }").unwrap_err();
        assert!(err.contains("no __kernel entry point"));
    }

    #[test]
    fn test_scan_non_void_return() {
        let err = scan_entry_points("__kernel int bad(int x) {}").unwrap_err();
        assert!(err.contains("must return void"));
    }

    #[test]
    fn test_scan_unbalanced_params() {
        let err = scan_entry_points("__kernel void bad(__global float* a {}").unwrap_err();
        assert!(err.contains("unbalanced"));
    }

    #[test]
    fn test_build_log_lists_entries() {
        let entries = scan_entry_points("__kernel void noop() {}").unwrap();
        let log = render_build_log(&entries);
        assert!(log.contains("entry points: 1"));
        assert!(log.contains("noop(0)"));
    }
}
