use std::collections::HashSet;

/// Brings a stored order in line with the fridges that actually exist.
///
/// Ids in `stored` that are not in `present` are dropped, as are repeats.
/// Ids in `present` that the stored order doesn't mention are appended in
/// the order `present` lists them. Known ids keep their relative order.
pub fn reconcile(stored: &[String], present: &[String]) -> Vec<String> {
    let present_set: HashSet<&str> = present.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();

    let mut result: Vec<String> = stored
        .iter()
        .filter(|id| present_set.contains(id.as_str()) && seen.insert(id.as_str()))
        .cloned()
        .collect();

    for id in present {
        if seen.insert(id.as_str()) {
            result.push(id.clone());
        }
    }
    result
}
