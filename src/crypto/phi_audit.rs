// Log hygiene: every `tracing::` call under src/ is scanned for field names
// and interpolations that would put patient data or credentials in the logs.
// Logs carry opaque ids only.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Substrings that must not appear inside a tracing macro invocation.
    const FORBIDDEN: &[&str] = &[
        // denormalized names on requests, reports and reviews
        "patient_name",
        "assistant_name",
        "doctor_name",
        // vitals and clinical content
        "medical_data",
        "blood_pressure",
        "blood_sugar",
        "heart_rate",
        "temperature",
        "diagnosis",
        "prescription",
        "advice",
        "rejection_reason",
        // credentials
        "password",
        // identifying values pulled off a user record
        ".email",
        "user.name",
        "caller.name",
        "file_name",
    ];

    const MACROS: &[&str] = &[
        "tracing::trace!",
        "tracing::debug!",
        "tracing::info!",
        "tracing::warn!",
        "tracing::error!",
    ];

    /// A tracing invocation joined onto one line, with its starting line number.
    struct Call {
        line: usize,
        text: String,
    }

    fn paren_balance(s: &str) -> i32 {
        s.chars().fold(0, |acc, c| match c {
            '(' => acc + 1,
            ')' => acc - 1,
            _ => acc,
        })
    }

    fn tracing_calls(source: &str) -> Vec<Call> {
        let lines: Vec<&str> = source.lines().map(str::trim).collect();
        let mut calls = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            if !MACROS.iter().any(|m| lines[i].starts_with(m)) {
                i += 1;
                continue;
            }
            let mut text = lines[i].to_string();
            let mut depth = paren_balance(lines[i]);
            let mut j = i + 1;
            while depth > 0 && j < lines.len() {
                text.push(' ');
                text.push_str(lines[j]);
                depth += paren_balance(lines[j]);
                j += 1;
            }
            calls.push(Call { line: i + 1, text });
            i = j;
        }
        calls
    }

    fn rust_sources(dir: &Path, out: &mut Vec<PathBuf>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                rust_sources(&path, out);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                out.push(path);
            }
        }
    }

    #[test]
    fn tracing_calls_carry_no_patient_data() {
        let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
        let mut files = Vec::new();
        rust_sources(&src, &mut files);
        assert!(!files.is_empty(), "no sources under {}", src.display());

        let mut findings = Vec::new();
        for path in files {
            // This file lists the patterns themselves.
            if path.ends_with("phi_audit.rs") {
                continue;
            }
            let Ok(source) = fs::read_to_string(&path) else {
                continue;
            };
            let shown = path.strip_prefix(&src).unwrap_or(&path).display().to_string();
            for call in tracing_calls(&source) {
                for pattern in FORBIDDEN.iter().filter(|p| call.text.contains(*p)) {
                    findings.push(format!("{shown}:{}: '{pattern}' in {}", call.line, call.text));
                }
            }
        }

        assert!(
            findings.is_empty(),
            "{} tracing call(s) log patient data; log ids instead:\n{}",
            findings.len(),
            findings.join("\n")
        );
    }

    #[test]
    fn multi_line_calls_are_joined() {
        let source = "fn f() {\n    tracing::info!(\n        report_id = %id,\n        bp = %data.blood_pressure,\n        \"stored\"\n    );\n}\n";
        let calls = tracing_calls(source);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].line, 2);
        assert!(calls[0].text.contains("blood_pressure"));
    }

    #[test]
    fn clean_call_has_no_findings() {
        let calls = tracing_calls(r#"tracing::info!(report_id = %report.id, "Report uploaded");"#);
        assert_eq!(calls.len(), 1);
        assert!(!FORBIDDEN.iter().any(|p| calls[0].text.contains(p)));
    }

    #[test]
    fn non_tracing_lines_are_ignored() {
        let calls = tracing_calls("let diagnosis = input.diagnosis.trim();\nprintln!(\"x\");\n");
        assert!(calls.is_empty());
    }
}
