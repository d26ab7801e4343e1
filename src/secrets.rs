/// Keys from `required` whose value is unset or blank, in the given order.
pub fn missing_secrets<F>(required: &[String], lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    required
        .iter()
        .filter(|key| lookup(key).map_or(true, |v| v.trim().is_empty()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn required() -> Vec<String> {
        ["MONGO_URI", "DRIVE_FOLDER_ID", "DRIVE_SA_JSON"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn complete_set_reports_nothing() {
        let env: HashMap<&str, &str> = [
            ("MONGO_URI", "mongodb://x"),
            ("DRIVE_FOLDER_ID", "F"),
            ("DRIVE_SA_JSON", "{}"),
        ]
        .into_iter()
        .collect();
        let missing = missing_secrets(&required(), |k| env.get(k).map(|v| v.to_string()));
        assert!(missing.is_empty());
    }

    #[test]
    fn unset_and_blank_values_are_both_missing() {
        let env: HashMap<&str, &str> = [("MONGO_URI", "mongodb://x"), ("DRIVE_FOLDER_ID", "  ")]
            .into_iter()
            .collect();
        let missing = missing_secrets(&required(), |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(missing, vec!["DRIVE_FOLDER_ID", "DRIVE_SA_JSON"]);
    }

    #[test]
    fn empty_requirement_list_never_blocks() {
        assert!(missing_secrets(&[], |_| None).is_empty());
    }
}
