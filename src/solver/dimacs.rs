use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use snafu::{ensure, ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum DimacsError {
    #[snafu(display("could not read '{name}': {source}"))]
    Read { name: String, source: io::Error },

    #[snafu(display("parse error in '{name}' at line {line}: {message}"))]
    Parse { name: String, line: usize, message: String },
}

pub type Result<T, E = DimacsError> = std::result::Result<T, E>;

/// A parsed DIMACS CNF formula with external (signed, one-based) literals.
/// `vars` is the declared count, grown to the largest variable actually
/// mentioned in a clause.
#[derive(Debug)]
pub struct Dimacs {
    pub vars: i32,
    pub clauses: Vec<Vec<i32>>,
}

/// Open a CNF file, transparently decompressing `.gz`.
pub fn open_path(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let capacity = 128 * 1024;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::with_capacity(capacity, GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::with_capacity(capacity, file)))
    }
}

fn parse_error(name: &str, line: usize, message: String) -> DimacsError {
    DimacsError::Parse {
        name: name.to_string(),
        line,
        message,
    }
}

/// Token-based DIMACS reader: comments, one `p cnf` header, zero-terminated
/// clauses which may span lines. Literals above the declared variable count
/// are accepted and grow the reported range.
pub fn parse(input: &mut dyn BufRead, name: &str) -> Result<Dimacs> {
    let mut header: Option<(i32, usize)> = None;
    let mut clauses: Vec<Vec<i32>> = Vec::new();
    let mut clause: Vec<i32> = Vec::new();
    let mut max_seen: u32 = 0;
    let mut line_number = 0;

    for line in input.lines() {
        let line = line.context(ReadSnafu { name })?;
        line_number += 1;

        if line.starts_with('c') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('p') {
            if header.is_some() {
                return Err(parse_error(name, line_number, "duplicate 'p cnf' header".to_string()));
            }
            let fields: Vec<&str> = rest.split_whitespace().collect();
            let parsed = match fields.as_slice() {
                ["cnf", vars, num_clauses] => vars
                    .parse::<i32>()
                    .ok()
                    .filter(|&vars| vars >= 0)
                    .zip(num_clauses.parse::<usize>().ok()),
                _ => None,
            };
            match parsed {
                Some(header_fields) => header = Some(header_fields),
                None => return Err(parse_error(name, line_number, format!("invalid header 'p{rest}'"))),
            }
            continue;
        }

        if header.is_none() {
            if line.trim().is_empty() {
                continue;
            }
            return Err(parse_error(name, line_number, "expected 'p cnf' header".to_string()));
        }

        for token in line.split_whitespace() {
            let lit: i32 = match token.parse() {
                Ok(lit) => lit,
                Err(_) => return Err(parse_error(name, line_number, format!("invalid literal '{token}'"))),
            };
            if lit == 0 {
                clauses.push(std::mem::take(&mut clause));
            } else {
                max_seen = max_seen.max(lit.unsigned_abs());
                clause.push(lit);
            }
        }
    }

    ensure!(
        clause.is_empty(),
        ParseSnafu {
            name,
            line: line_number,
            message: "unterminated clause at end-of-file",
        }
    );
    let Some((vars, declared)) = header else {
        return Err(parse_error(name, line_number, "expected 'p cnf' header".to_string()));
    };
    ensure!(
        clauses.len() == declared,
        ParseSnafu {
            name,
            line: line_number,
            message: format!("found {} clauses but header declares {}", clauses.len(), declared),
        }
    );

    let vars = vars.max(i32::try_from(max_seen).unwrap_or(i32::MAX));
    Ok(Dimacs { vars, clauses })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse_str(input: &str) -> Result<Dimacs> {
        parse(&mut Cursor::new(input), "<test>")
    }

    #[test]
    fn parses_simple_formula() {
        let dimacs = parse_str("c comment\np cnf 3 2\n1 -2 0\n2 3 0\n").unwrap();
        assert_eq!(dimacs.vars, 3);
        assert_eq!(dimacs.clauses, vec![vec![1, -2], vec![2, 3]]);
    }

    #[test]
    fn clauses_may_span_lines() {
        let dimacs = parse_str("p cnf 4 2\n1 2\n3 0 4\n0\n").unwrap();
        assert_eq!(dimacs.clauses, vec![vec![1, 2, 3], vec![4]]);
    }

    #[test]
    fn rejects_missing_header() {
        let err = parse_str("1 0\n").unwrap_err();
        assert!(err.to_string().contains("header"));
    }

    #[test]
    fn rejects_unterminated_clause() {
        let err = parse_str("p cnf 2 1\n1 2\n").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn literals_above_the_header_grow_the_range() {
        let dimacs = parse_str("p cnf 2 2\n1 2 0\n3 -4 0\n").unwrap();
        assert_eq!(dimacs.vars, 4);
        assert_eq!(dimacs.clauses, vec![vec![1, 2], vec![3, -4]]);
    }

    #[test]
    fn header_larger_than_used_range_wins() {
        let dimacs = parse_str("p cnf 5 1\n1 -2 0\n").unwrap();
        assert_eq!(dimacs.vars, 5);
    }

    #[test]
    fn rejects_clause_count_mismatch() {
        let err = parse_str("p cnf 2 2\n1 0\n").unwrap_err();
        assert!(err.to_string().contains("declares"));
    }

    #[test]
    fn rejects_garbage_token() {
        let err = parse_str("p cnf 2 1\n1 x 0\n").unwrap_err();
        assert!(err.to_string().contains("invalid literal"));
    }
}
