//! The bounded SPARQL `SELECT` dialect spec §4.4 names for the in-memory
//! RDF adapter: basic graph patterns with shared-variable joins, `FILTER`
//! (comparison, `IN`, `CONTAINS(LCASE(STR(?x)), lit)`), `BIND` with
//! `SUBSTR`/`CONCAT`, `COUNT`/`AVG`/`MAX`, `GROUP BY`, and `ORDER BY … LIMIT`.
//!
//! Spec §9 calls this the "SPARQL simulation" stub and requires the full
//! dialect be implemented rather than left as a log-and-return-empty path.
//! This is not a general SPARQL engine: no `OPTIONAL`, no `UNION`, no
//! property paths — exactly the shapes retrieval and [`crate::query`] issue.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::storage::rdf_store::Triple;
use crate::storage::Row;

#[derive(Debug, Clone, PartialEq)]
enum Term {
    Var(String),
    Fixed(String),
}

impl Term {
    fn parse(token: &str) -> Term {
        match token.strip_prefix('?') {
            Some(name) => Term::Var(name.to_string()),
            None => Term::Fixed(token.trim_matches(['<', '>']).trim_matches('"').to_string()),
        }
    }
}

#[derive(Debug, Clone)]
struct TriplePattern {
    subject: Term,
    predicate: Term,
    object: Term,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone)]
enum FilterExpr {
    Compare { var: String, op: CompareOp, value: String },
    In { var: String, values: Vec<String> },
    /// `CONTAINS(LCASE(STR(?var)), "needle")`. Collation rule (spec §9):
    /// case-folding is Unicode simple lowercasing via `str::to_lowercase`,
    /// not locale-aware — matches how `keyword::keyword_search` folds case
    /// elsewhere in the crate, so a query and a content scan agree on hits.
    Contains { var: String, needle: String },
}

#[derive(Debug, Clone)]
enum BindExpr {
    Substr { var: String, start: usize, len: Option<usize> },
    Concat { parts: Vec<Term> },
}

#[derive(Debug, Clone)]
struct Bind {
    target: String,
    expr: BindExpr,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AggKind {
    Count,
    Avg,
    Max,
}

#[derive(Debug, Clone)]
enum SelectItem {
    Var(String),
    Agg { kind: AggKind, arg: String, alias: String },
}

#[derive(Debug, Clone, Copy)]
enum OrderDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
struct ParsedQuery {
    select: Vec<SelectItem>,
    patterns: Vec<TriplePattern>,
    filters: Vec<FilterExpr>,
    binds: Vec<Bind>,
    group_by: Option<String>,
    order_by: Option<(String, OrderDir)>,
    limit: Option<usize>,
}

/// Splits a `WHERE` body into top-level clauses on `.`, respecting quotes
/// and parens so `"0.8"` and `FILTER(?c >= 0.8)` aren't split mid-token.
fn split_clauses(body: &str) -> Vec<String> {
    let mut clauses = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    for ch in body.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '(' if !in_quotes => {
                depth += 1;
                current.push(ch);
            }
            ')' if !in_quotes => {
                depth -= 1;
                current.push(ch);
            }
            '.' if !in_quotes && depth == 0 => {
                if !current.trim().is_empty() {
                    clauses.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        clauses.push(current.trim().to_string());
    }
    clauses
}

fn parse_triple_pattern(clause: &str) -> Result<TriplePattern> {
    let mut parts = clause.splitn(3, char::is_whitespace);
    let subject = parts.next().ok_or_else(|| Error::query_shape("empty triple pattern", (0, clause.len())))?;
    let predicate = parts.next().ok_or_else(|| Error::query_shape("triple pattern missing predicate", (0, clause.len())))?;
    let object = parts.next().ok_or_else(|| Error::query_shape("triple pattern missing object", (0, clause.len())))?;
    Ok(TriplePattern { subject: Term::parse(subject), predicate: Term::parse(predicate), object: Term::parse(object.trim()) })
}

fn parse_filter(inner: &str) -> Result<FilterExpr> {
    let inner = inner.trim();
    if let Some(rest) = inner.strip_prefix("CONTAINS(") {
        let rest = rest.strip_suffix(')').ok_or_else(|| Error::query_shape("unterminated CONTAINS(...)", (0, inner.len())))?;
        let (lhs, needle) = rest.split_once(',').ok_or_else(|| Error::query_shape("CONTAINS requires two arguments", (0, inner.len())))?;
        let lhs = lhs.trim();
        let var = lhs
            .strip_prefix("LCASE(STR(")
            .and_then(|s| s.strip_suffix("))"))
            .and_then(|s| s.strip_prefix('?'))
            .ok_or_else(|| Error::query_shape("only CONTAINS(LCASE(STR(?var)), lit) is supported", (0, inner.len())))?;
        let needle = needle.trim().trim_matches('"').to_lowercase();
        return Ok(FilterExpr::Contains { var: var.to_string(), needle });
    }

    if let Some(var) = inner.strip_prefix('?') {
        if let Some((var, rest)) = var.split_once(" IN ") {
            let list = rest.trim().trim_start_matches('(').trim_end_matches(')');
            let values = list.split(',').map(|v| v.trim().trim_matches('"').to_string()).collect();
            return Ok(FilterExpr::In { var: var.to_string(), values });
        }
    }

    for (token, op) in [(">=", CompareOp::Ge), ("<=", CompareOp::Le), ("!=", CompareOp::Ne), (">", CompareOp::Gt), ("<", CompareOp::Lt), ("=", CompareOp::Eq)] {
        if let Some((lhs, rhs)) = inner.split_once(token) {
            let var = lhs.trim().trim_start_matches('?');
            if var.is_empty() || var.contains(char::is_whitespace) {
                continue;
            }
            let value = rhs.trim().trim_matches('"').to_string();
            return Ok(FilterExpr::Compare { var: var.to_string(), op, value });
        }
    }

    Err(Error::query_shape(format!("unsupported FILTER expression: {inner}"), (0, inner.len())))
}

fn parse_bind(clause: &str) -> Result<Bind> {
    let inner = clause
        .strip_prefix("BIND(")
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| Error::query_shape("malformed BIND(...)", (0, clause.len())))?;
    let (expr, target) = inner.rsplit_once(" AS ").ok_or_else(|| Error::query_shape("BIND requires ... AS ?var", (0, clause.len())))?;
    let target = target.trim().trim_start_matches('?').to_string();
    let expr = expr.trim();

    if let Some(args) = expr.strip_prefix("SUBSTR(").and_then(|s| s.strip_suffix(')')) {
        let mut parts = args.split(',').map(str::trim);
        let var = parts
            .next()
            .and_then(|t| t.strip_prefix('?'))
            .ok_or_else(|| Error::query_shape("SUBSTR's first argument must be a variable", (0, clause.len())))?;
        let start: usize = parts
            .next()
            .ok_or_else(|| Error::query_shape("SUBSTR requires a start index", (0, clause.len())))?
            .parse()
            .map_err(|_| Error::query_shape("SUBSTR start index must be an integer", (0, clause.len())))?;
        let len = parts.next().and_then(|s| s.parse().ok());
        return Ok(Bind { target, expr: BindExpr::Substr { var: var.to_string(), start, len } });
    }

    if let Some(args) = expr.strip_prefix("CONCAT(").and_then(|s| s.strip_suffix(')')) {
        let parts = args.split(',').map(|t| Term::parse(t.trim())).collect();
        return Ok(Bind { target, expr: BindExpr::Concat { parts } });
    }

    Err(Error::query_shape(format!("unsupported BIND expression: {expr}"), (0, clause.len())))
}

/// Index of the `)` that closes an already-consumed `(`, accounting for
/// nested parens (e.g. the `COUNT(?s)` inside `(COUNT(?s) AS ?count)`).
fn matching_close_paren(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

fn parse_select_items(clause: &str) -> Result<Vec<SelectItem>> {
    let mut items = Vec::new();
    let mut rest = clause.trim();
    while !rest.is_empty() {
        rest = rest.trim_start();
        if let Some(after_paren) = rest.strip_prefix('(') {
            let close = matching_close_paren(after_paren).ok_or_else(|| Error::query_shape("unterminated aggregate expression", (0, clause.len())))?;
            let body = &after_paren[..close];
            let (agg, alias) = body.split_once(" AS ").ok_or_else(|| Error::query_shape("aggregate expression requires AS ?alias", (0, clause.len())))?;
            let alias = alias.trim().trim_start_matches('?').to_string();
            let (kind_str, arg) = agg
                .split_once('(')
                .ok_or_else(|| Error::query_shape("malformed aggregate function", (0, clause.len())))?;
            let kind = match kind_str.trim() {
                "COUNT" => AggKind::Count,
                "AVG" => AggKind::Avg,
                "MAX" => AggKind::Max,
                other => return Err(Error::query_shape(format!("unsupported aggregate: {other}"), (0, clause.len()))),
            };
            let arg = arg.trim_end_matches(')').trim().trim_start_matches('?').to_string();
            items.push(SelectItem::Agg { kind, arg, alias });
            rest = &after_paren[close + 1..];
        } else {
            let (token, remainder) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if let Some(var) = token.strip_prefix('?') {
                items.push(SelectItem::Var(var.to_string()));
            }
            rest = remainder;
        }
    }
    Ok(items)
}

fn parse_query(text: &str) -> Result<ParsedQuery> {
    let select_start = text.find("SELECT").ok_or_else(|| Error::query_shape("expected SELECT", (0, text.len())))? + "SELECT".len();
    let where_start = text.find("WHERE").ok_or_else(|| Error::query_shape("expected WHERE", (0, text.len())))?;
    let select = parse_select_items(&text[select_start..where_start])?;

    let brace_start = text.find('{').ok_or_else(|| Error::query_shape("expected WHERE { ... }", (0, text.len())))?;
    let brace_end = text.find('}').ok_or_else(|| Error::query_shape("unterminated WHERE clause", (brace_start, text.len())))?;
    let body = &text[brace_start + 1..brace_end];

    let mut patterns = Vec::new();
    let mut filters = Vec::new();
    let mut binds = Vec::new();
    for clause in split_clauses(body) {
        if let Some(inner) = clause.strip_prefix("FILTER(").and_then(|s| s.strip_suffix(')')) {
            filters.push(parse_filter(inner)?);
        } else if clause.starts_with("BIND(") {
            binds.push(parse_bind(&clause)?);
        } else {
            patterns.push(parse_triple_pattern(&clause)?);
        }
    }

    let tail = &text[brace_end + 1..];
    let group_by = tail
        .find("GROUP BY")
        .and_then(|i| tail[i + "GROUP BY".len()..].trim().split_whitespace().next())
        .map(|v| v.trim_start_matches('?').to_string());

    let order_by = tail.find("ORDER BY").map(|i| {
        let rest = tail[i + "ORDER BY".len()..].trim();
        if let Some(inner) = rest.strip_prefix("DESC(").and_then(|s| s.split(')').next()) {
            (inner.trim_start_matches('?').to_string(), OrderDir::Desc)
        } else {
            let var = rest.split_whitespace().next().unwrap_or("").trim_start_matches('?');
            (var.to_string(), OrderDir::Asc)
        }
    });

    let limit = tail.find("LIMIT").and_then(|i| tail[i + "LIMIT".len()..].trim().split_whitespace().next()).and_then(|s| s.parse().ok());

    Ok(ParsedQuery { select, patterns, filters, binds, group_by, order_by, limit })
}

type Binding = HashMap<String, String>;

fn term_value<'a>(term: &'a Term, binding: &'a Binding) -> Option<&'a str> {
    match term {
        Term::Var(name) => binding.get(name).map(String::as_str),
        Term::Fixed(value) => Some(value.as_str()),
    }
}

fn match_pattern(pattern: &TriplePattern, triple: &Triple, binding: &Binding) -> Option<Binding> {
    let mut next = binding.clone();
    for (term, value) in [(&pattern.subject, triple.subject.as_str()), (&pattern.predicate, triple.predicate.as_str()), (&pattern.object, triple.object.as_str())] {
        match term {
            Term::Fixed(expected) => {
                if expected != value {
                    return None;
                }
            }
            Term::Var(name) => match next.get(name) {
                Some(bound) if bound != value => return None,
                _ => {
                    next.insert(name.clone(), value.to_string());
                }
            },
        }
    }
    Some(next)
}

fn run_patterns(patterns: &[TriplePattern], triples: &[Triple]) -> Vec<Binding> {
    let mut bindings = vec![Binding::new()];
    for pattern in patterns {
        let mut next = Vec::new();
        for binding in &bindings {
            for triple in triples {
                if let Some(extended) = match_pattern(pattern, triple, binding) {
                    next.push(extended);
                }
            }
        }
        bindings = next;
        if bindings.is_empty() {
            break;
        }
    }
    bindings
}

/// Numeric if both sides parse as `f64`, lexicographic otherwise — the same
/// fallback `ORDER BY`/aggregate comparisons use, so a dialect that mixes
/// numeric and textual literals (timestamps, names) degrades gracefully
/// instead of erroring.
fn compare_values(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.cmp(b),
    }
}

fn apply_filter(filter: &FilterExpr, binding: &Binding) -> bool {
    match filter {
        FilterExpr::Compare { var, op, value } => match binding.get(var) {
            Some(bound) => {
                let ord = compare_values(bound, value);
                match op {
                    CompareOp::Lt => ord == std::cmp::Ordering::Less,
                    CompareOp::Le => ord != std::cmp::Ordering::Greater,
                    CompareOp::Gt => ord == std::cmp::Ordering::Greater,
                    CompareOp::Ge => ord != std::cmp::Ordering::Less,
                    CompareOp::Eq => ord == std::cmp::Ordering::Equal,
                    CompareOp::Ne => ord != std::cmp::Ordering::Equal,
                }
            }
            None => false,
        },
        FilterExpr::In { var, values } => binding.get(var).map(|bound| values.iter().any(|v| v == bound)).unwrap_or(false),
        FilterExpr::Contains { var, needle } => binding.get(var).map(|bound| bound.to_lowercase().contains(needle.as_str())).unwrap_or(false),
    }
}

fn apply_bind(bind: &Bind, binding: &mut Binding) {
    let value = match &bind.expr {
        BindExpr::Substr { var, start, len } => {
            let Some(source) = binding.get(var) else { return };
            let chars: Vec<char> = source.chars().collect();
            let from = start.saturating_sub(1).min(chars.len());
            let to = len.map(|l| (from + l).min(chars.len())).unwrap_or(chars.len());
            chars[from..to].iter().collect()
        }
        BindExpr::Concat { parts } => parts.iter().filter_map(|t| term_value(t, binding)).collect::<Vec<_>>().join(""),
    };
    binding.insert(bind.target.clone(), value);
}

fn aggregate(kind: AggKind, values: &[&str]) -> String {
    match kind {
        AggKind::Count => values.len().to_string(),
        AggKind::Avg => {
            let nums: Vec<f64> = values.iter().filter_map(|v| v.parse().ok()).collect();
            if nums.is_empty() { "0".to_string() } else { (nums.iter().sum::<f64>() / nums.len() as f64).to_string() }
        }
        AggKind::Max => values.iter().max_by(|a, b| compare_values(a, b)).unwrap_or(&"").to_string(),
    }
}

fn project(select: &[SelectItem], group_key: Option<&str>, group: &[Binding]) -> Row {
    let mut row = Row::new();
    for item in select {
        match item {
            SelectItem::Var(name) => {
                let value = group.first().and_then(|b| b.get(name)).cloned().unwrap_or_default();
                row.insert(name.clone(), Value::String(value));
            }
            SelectItem::Agg { kind, arg, alias } => {
                let values: Vec<&str> = group.iter().filter_map(|b| b.get(arg)).map(String::as_str).collect();
                row.insert(alias.clone(), Value::String(aggregate(*kind, &values)));
            }
        }
    }
    if let Some(key) = group_key {
        row.entry(key.to_string()).or_insert_with(|| Value::String(group.first().and_then(|b| b.get(key)).cloned().unwrap_or_default()));
    }
    row
}

/// Interprets the bounded `SELECT` dialect of spec §4.4 over `triples`.
pub fn execute_select(pattern: &str, triples: &[Triple]) -> Result<Vec<Row>> {
    let query = parse_query(pattern)?;
    let mut bindings = run_patterns(&query.patterns, triples);
    for bind in &query.binds {
        for binding in &mut bindings {
            apply_bind(bind, binding);
        }
    }
    bindings.retain(|b| query.filters.iter().all(|f| apply_filter(f, b)));

    // ORDER BY may name a variable the SELECT clause didn't project (e.g.
    // sorting facts by confidence while only returning ?s); widen the
    // projection so the sort has something to read, without touching what
    // the caller asked for otherwise.
    let mut select = query.select.clone();
    if let Some((var, _)) = &query.order_by {
        if !select.iter().any(|item| matches!(item, SelectItem::Var(v) if v == var) || matches!(item, SelectItem::Agg { alias, .. } if alias == var)) {
            select.push(SelectItem::Var(var.clone()));
        }
    }

    let mut rows = if let Some(group_var) = &query.group_by {
        let mut groups: Vec<(String, Vec<Binding>)> = Vec::new();
        for binding in bindings {
            let key = binding.get(group_var).cloned().unwrap_or_default();
            match groups.iter_mut().find(|(k, _)| k == &key) {
                Some((_, members)) => members.push(binding),
                None => groups.push((key, vec![binding])),
            }
        }
        groups.into_iter().map(|(_, members)| project(&select, Some(group_var), &members)).collect()
    } else if query.select.iter().any(|item| matches!(item, SelectItem::Agg { .. })) {
        vec![project(&select, None, &bindings)]
    } else {
        bindings.iter().map(|b| project(&select, None, std::slice::from_ref(b))).collect()
    };

    if let Some((var, dir)) = &query.order_by {
        rows.sort_by(|a, b| {
            let av = a.get(var).and_then(|v| v.as_str()).unwrap_or("");
            let bv = b.get(var).and_then(|v| v.as_str()).unwrap_or("");
            let ord = compare_values(av, bv);
            match dir {
                OrderDir::Asc => ord,
                OrderDir::Desc => ord.reverse(),
            }
        });
    }

    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::rdf_store::RdfObject;

    fn triple(s: &str, p: &str, o: RdfObject) -> Triple {
        Triple::new(s, p, o)
    }

    #[test]
    fn basic_graph_pattern_joins_on_shared_variable() {
        let triples = vec![
            triple("zepent:1", "zep:name", RdfObject::literal("Alice", "xsd:string")),
            triple("zepent:1", "rdf:type", RdfObject::uri("zep:Entity")),
        ];
        let rows = execute_select("SELECT ?p ?o WHERE { zepent:1 ?p ?o }", &triples).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn filter_comparison_excludes_below_threshold() {
        let triples = vec![
            triple("s1", "zep:confidence", RdfObject::literal("0.9", "xsd:float")),
            triple("s2", "zep:confidence", RdfObject::literal("0.5", "xsd:float")),
        ];
        let rows = execute_select("SELECT ?s WHERE { ?s zep:confidence ?c . FILTER(?c >= 0.8) }", &triples).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("s").unwrap(), "s1");
    }

    #[test]
    fn filter_in_matches_any_listed_value() {
        let triples = vec![triple("s1", "rdf:type", RdfObject::uri("zep:Person")), triple("s2", "rdf:type", RdfObject::uri("zep:Place"))];
        let rows = execute_select(r#"SELECT ?s WHERE { ?s rdf:type ?t . FILTER(?t IN ("zep:Person", "zep:Org")) }"#, &triples).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("s").unwrap(), "s1");
    }

    #[test]
    fn filter_contains_lcase_is_case_insensitive_and_unicode_aware() {
        let triples = vec![triple("s1", "zep:content", RdfObject::literal("Visited CAFÉ today", "xsd:string"))];
        let rows = execute_select(r#"SELECT ?s WHERE { ?s zep:content ?c . FILTER(CONTAINS(LCASE(STR(?c)), "café")) }"#, &triples).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn count_aggregates_over_all_matches_without_group_by() {
        let triples = vec![
            triple("e1", "rdf:type", RdfObject::uri("zep:EpisodicMemory")),
            triple("e2", "rdf:type", RdfObject::uri("zep:EpisodicMemory")),
        ];
        let rows = execute_select("SELECT (COUNT(?s) AS ?count) WHERE { ?s rdf:type zep:EpisodicMemory }", &triples).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("count").unwrap(), "2");
    }

    #[test]
    fn group_by_bound_variable_buckets_counts_per_group() {
        let triples = vec![
            triple("e1", "rdf:type", RdfObject::uri("zep:EpisodicMemory")),
            triple("e1", "zep:createdAt", RdfObject::literal("2026-01-05T00:00:00Z", "xsd:dateTime")),
            triple("e2", "rdf:type", RdfObject::uri("zep:EpisodicMemory")),
            triple("e2", "zep:createdAt", RdfObject::literal("2026-01-20T00:00:00Z", "xsd:dateTime")),
            triple("e3", "rdf:type", RdfObject::uri("zep:EpisodicMemory")),
            triple("e3", "zep:createdAt", RdfObject::literal("2026-02-01T00:00:00Z", "xsd:dateTime")),
        ];
        let rows = execute_select(
            "SELECT ?month (COUNT(?s) AS ?count) WHERE { ?s rdf:type zep:EpisodicMemory . ?s zep:createdAt ?created . BIND(SUBSTR(?created, 1, 7) AS ?month) } GROUP BY ?month",
            &triples,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        let january = rows.iter().find(|r| r.get("month").unwrap() == "2026-01").unwrap();
        assert_eq!(january.get("count").unwrap(), "2");
        let february = rows.iter().find(|r| r.get("month").unwrap() == "2026-02").unwrap();
        assert_eq!(february.get("count").unwrap(), "1");
    }

    #[test]
    fn order_by_desc_then_limit_keeps_the_top_result() {
        let triples = vec![
            triple("s1", "zep:confidence", RdfObject::literal("0.5", "xsd:float")),
            triple("s2", "zep:confidence", RdfObject::literal("0.9", "xsd:float")),
        ];
        let rows = execute_select("SELECT ?s WHERE { ?s zep:confidence ?c } ORDER BY DESC(?c) LIMIT 1", &triples).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("s").unwrap(), "s2");
    }

    #[test]
    fn reification_pattern_joins_statement_triples_on_shared_variable() {
        let triples = vec![
            triple("stmt1", "rdf:subject", RdfObject::uri("zepent:1")),
            triple("stmt1", "rdf:predicate", RdfObject::uri("zep:worksAt")),
            triple("stmt1", "rdf:object", RdfObject::uri("zepent:2")),
            triple("stmt1", "zep:confidence", RdfObject::literal("0.9", "xsd:float")),
        ];
        let rows = execute_select(
            "SELECT ?conf WHERE { ?stmt rdf:subject zepent:1 . ?stmt rdf:predicate zep:worksAt . ?stmt rdf:object zepent:2 . ?stmt zep:confidence ?conf }",
            &triples,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("conf").unwrap(), "0.9");
    }
}
