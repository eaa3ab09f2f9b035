// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for nameserver glue validation.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::dns_errors::SyncError;
    use crate::glue::validate_glue;

    fn glue(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_in_zone_nameserver_with_glue_passes() {
        let nameservers = vec!["ns1.example.com.".to_string()];
        let addresses = glue(&[("ns1.example.com.", "10.0.0.1")]);

        assert!(validate_glue("example.com", &nameservers, &addresses).is_ok());
    }

    #[test]
    fn test_in_zone_nameserver_without_glue_fails() {
        let nameservers = vec!["ns1.example.com.".to_string()];
        let addresses = glue(&[]);

        let err = validate_glue("example.com", &nameservers, &addresses).unwrap_err();
        match err {
            SyncError::MissingGlueRecord { zone, nameservers } => {
                assert_eq!(zone, "example.com");
                assert_eq!(nameservers, vec!["ns1.example.com.".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_zone_nameserver_needs_no_glue() {
        let nameservers = vec!["ns1.dnsprovider.net.".to_string()];
        let addresses = glue(&[]);

        assert!(validate_glue("example.com", &nameservers, &addresses).is_ok());
    }

    #[test]
    fn test_relative_glue_key_matches() {
        // Glue keyed by the label relative to the zone satisfies the FQDN.
        let nameservers = vec!["ns1.example.com.".to_string()];
        let addresses = glue(&[("ns1", "10.0.0.1")]);

        assert!(validate_glue("example.com", &nameservers, &addresses).is_ok());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let nameservers = vec!["NS1.Example.COM.".to_string()];
        let addresses = glue(&[("ns1.example.com", "10.0.0.1")]);

        assert!(validate_glue("Example.COM.", &nameservers, &addresses).is_ok());
    }

    #[test]
    fn test_zone_apex_nameserver_is_in_zone() {
        // A nameserver named exactly like the zone still needs glue.
        let nameservers = vec!["example.com.".to_string()];
        let addresses = glue(&[]);

        let err = validate_glue("example.com", &nameservers, &addresses).unwrap_err();
        assert!(matches!(err, SyncError::MissingGlueRecord { .. }));
    }

    #[test]
    fn test_all_missing_nameservers_are_reported() {
        let nameservers = vec![
            "ns1.example.com.".to_string(),
            "ns2.example.com.".to_string(),
            "ns3.dnsprovider.net.".to_string(),
        ];
        let addresses = glue(&[]);

        let err = validate_glue("example.com", &nameservers, &addresses).unwrap_err();
        match err {
            SyncError::MissingGlueRecord { nameservers, .. } => {
                assert_eq!(
                    nameservers,
                    vec!["ns1.example.com.".to_string(), "ns2.example.com.".to_string()]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_suffix_match_requires_label_boundary() {
        // "badexample.com" is not inside "example.com".
        let nameservers = vec!["ns1.badexample.com.".to_string()];
        let addresses = glue(&[]);

        assert!(validate_glue("example.com", &nameservers, &addresses).is_ok());
    }

    #[test]
    fn test_no_nameservers_passes() {
        assert!(validate_glue("example.com", &[], &glue(&[])).is_ok());
    }
}
