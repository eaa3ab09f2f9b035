// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the record codec.

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::codec::{decode, normalize, record_data_map, RecordType, StructuredValue};
    use crate::dns_errors::RecordDataError;

    #[test]
    fn test_record_type_parse_case_insensitive() {
        assert_eq!(RecordType::from_str("a").unwrap(), RecordType::A);
        assert_eq!(RecordType::from_str("AAAA").unwrap(), RecordType::Aaaa);
        assert_eq!(RecordType::from_str("cname").unwrap(), RecordType::Cname);
        assert_eq!(RecordType::from_str(" mx ").unwrap(), RecordType::Mx);
        assert_eq!(RecordType::from_str("NaPtR").unwrap(), RecordType::Naptr);
    }

    #[test]
    fn test_record_type_parse_rejects_unknown() {
        let err = RecordType::from_str("SPF").unwrap_err();
        assert_eq!(
            err,
            RecordDataError::UnsupportedRecordType {
                value: "SPF".to_string()
            }
        );
    }

    #[test]
    fn test_record_type_display_round_trips() {
        for rtype in RecordType::ALL {
            assert_eq!(RecordType::from_str(rtype.as_str()).unwrap(), rtype);
        }
    }

    #[test]
    fn test_only_cname_is_exclusive_at_owner() {
        for rtype in RecordType::ALL {
            assert_eq!(
                rtype.is_exclusive_at_owner(),
                rtype == RecordType::Cname,
                "{rtype}"
            );
        }
    }

    #[test]
    fn test_decode_a_record() {
        let value = decode(RecordType::A, "10.0.1.100").unwrap();
        assert_eq!(
            value,
            StructuredValue::Address {
                address: "10.0.1.100".to_string()
            }
        );
    }

    #[test]
    fn test_decode_srv_record() {
        let value = decode(RecordType::Srv, "10 60 5060 sip.example.com.").unwrap();
        assert_eq!(
            value,
            StructuredValue::Srv {
                priority: 10,
                weight: 60,
                port: 5060,
                target: "sip.example.com.".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_mx_record() {
        let value = decode(RecordType::Mx, "10 mail.example.com.").unwrap();
        assert_eq!(
            value,
            StructuredValue::Mx {
                preference: 10,
                exchange: "mail.example.com.".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_preserves_name_verbatim() {
        // No auto-qualification: a missing trailing dot stays missing.
        let value = decode(RecordType::Cname, "web.Example.COM").unwrap();
        assert_eq!(
            value,
            StructuredValue::Target {
                target: "web.Example.COM".to_string()
            }
        );
    }

    #[test]
    fn test_decode_txt_with_spaces() {
        let value = decode(RecordType::Txt, "\"v=spf1 include:_spf.example.com ~all\"").unwrap();
        assert_eq!(
            value,
            StructuredValue::Txt {
                text: "v=spf1 include:_spf.example.com ~all".to_string()
            }
        );
    }

    #[test]
    fn test_decode_txt_unquoted() {
        let value = decode(RecordType::Txt, "hello world").unwrap();
        assert_eq!(
            value,
            StructuredValue::Txt {
                text: "hello world".to_string()
            }
        );
    }

    #[test]
    fn test_decode_txt_with_escaped_quotes() {
        let value = decode(RecordType::Txt, "\"say \\\"hi\\\"\"").unwrap();
        assert_eq!(
            value,
            StructuredValue::Txt {
                text: "say \"hi\"".to_string()
            }
        );
    }

    #[test]
    fn test_decode_caa_record() {
        let value = decode(RecordType::Caa, "0 issue \"letsencrypt.org\"").unwrap();
        assert_eq!(
            value,
            StructuredValue::Caa {
                flags: 0,
                tag: "issue".to_string(),
                value: "letsencrypt.org".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_naptr_record() {
        let value = decode(
            RecordType::Naptr,
            "100 50 \"s\" \"SIP+D2U\" \"\" _sip._udp.example.com.",
        )
        .unwrap();
        assert_eq!(
            value,
            StructuredValue::Naptr {
                order: 100,
                preference: 50,
                flags: "s".to_string(),
                services: "SIP+D2U".to_string(),
                regexp: String::new(),
                replacement: "_sip._udp.example.com.".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_sshfp_preserves_hex_case() {
        let value = decode(RecordType::Sshfp, "4 2 AbCdEf0123").unwrap();
        assert_eq!(
            value,
            StructuredValue::Sshfp {
                algorithm: 4,
                fingerprint_type: 2,
                fingerprint: "AbCdEf0123".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_tlsa_record() {
        let value = decode(RecordType::Tlsa, "3 1 1 d2abde240d").unwrap();
        assert_eq!(
            value,
            StructuredValue::Tlsa {
                usage: 3,
                selector: 1,
                matching_type: 1,
                certificate_data: "d2abde240d".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_opaque_type_keeps_fields() {
        let value = decode(RecordType::Hinfo, "\"PDP-11\" \"UNIX\"").unwrap();
        assert_eq!(
            value,
            StructuredValue::Opaque {
                fields: vec!["PDP-11".to_string(), "UNIX".to_string()],
            }
        );
    }

    #[test]
    fn test_decode_empty_rdata() {
        let err = decode(RecordType::A, "   ").unwrap_err();
        assert_eq!(err, RecordDataError::EmptyRecordData { rtype: RecordType::A });
    }

    #[test]
    fn test_decode_wrong_arity() {
        let err = decode(RecordType::Mx, "mail.example.com.").unwrap_err();
        assert!(matches!(
            err,
            RecordDataError::MalformedRecordData { rtype: RecordType::Mx, .. }
        ));
        assert!(err.to_string().contains("expected 2 field(s), got 1"));
    }

    #[test]
    fn test_decode_non_integer_field() {
        let err = decode(RecordType::Srv, "ten 60 5060 sip.example.com.").unwrap_err();
        assert!(err.to_string().contains("'ten' is not an integer"));
    }

    #[test]
    fn test_decode_integer_out_of_range() {
        let err = decode(RecordType::Caa, "256 issue \"ca.example.net\"").unwrap_err();
        assert!(err.to_string().contains("'256' is not an integer in 0..=255"));
    }

    #[test]
    fn test_decode_non_hex_fingerprint() {
        let err = decode(RecordType::Sshfp, "4 2 nothex!").unwrap_err();
        assert!(err.to_string().contains("'nothex!' is not hexadecimal"));
    }

    #[test]
    fn test_decode_unterminated_quote() {
        let err = decode(RecordType::Caa, "0 issue \"letsencrypt.org").unwrap_err();
        assert!(err.to_string().contains("unterminated quoted string"));
    }

    #[test]
    fn test_normalize_collapses_separators() {
        let normalized = normalize(RecordType::Srv, "  10   60  5060   sip.example.com. ").unwrap();
        assert_eq!(normalized, "10 60 5060 sip.example.com.");
    }

    #[test]
    fn test_normalize_quotes_txt_consistently() {
        let bare = normalize(RecordType::Txt, "v=spf1 -all").unwrap();
        let quoted = normalize(RecordType::Txt, "\"v=spf1 -all\"").unwrap();
        assert_eq!(bare, "\"v=spf1 -all\"");
        assert_eq!(bare, quoted);
    }

    #[test]
    fn test_normalize_preserves_case() {
        let normalized = normalize(RecordType::Cname, "Web.Example.COM.").unwrap();
        assert_eq!(normalized, "Web.Example.COM.");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            (RecordType::A, "10.0.1.100"),
            (RecordType::Mx, " 10   mail.example.com. "),
            (RecordType::Txt, "v=spf1 include:_spf.example.com ~all"),
            (RecordType::Caa, "0 issue letsencrypt.org"),
            (
                RecordType::Naptr,
                "100 50 \"s\" \"SIP+D2U\" \"\" _sip._udp.example.com.",
            ),
            (RecordType::Uri, "10 1 \"https://example.com/\""),
        ];
        for (rtype, raw) in inputs {
            let once = normalize(rtype, raw).unwrap();
            let twice = normalize(rtype, &once).unwrap();
            assert_eq!(once, twice, "{rtype} '{raw}'");
        }
    }

    #[test]
    fn test_decode_inverts_encode() {
        let values = [
            (
                RecordType::Mx,
                StructuredValue::Mx {
                    preference: 10,
                    exchange: "mail.example.com.".to_string(),
                },
            ),
            (
                RecordType::Txt,
                StructuredValue::Txt {
                    text: "path=\\root \"quoted\"".to_string(),
                },
            ),
            (
                RecordType::Naptr,
                StructuredValue::Naptr {
                    order: 100,
                    preference: 50,
                    flags: "s".to_string(),
                    services: "SIP+D2U".to_string(),
                    regexp: String::new(),
                    replacement: ".".to_string(),
                },
            ),
        ];
        for (rtype, value) in values {
            let decoded = decode(rtype, &value.to_rdata()).unwrap();
            assert_eq!(decoded, value, "{rtype}");
        }
    }

    #[test]
    fn test_record_data_map_a_record() {
        let data = record_data_map(RecordType::A, "10.0.1.100");
        assert_eq!(data.len(), 1);
        assert_eq!(data["address"], "10.0.1.100");
    }

    #[test]
    fn test_record_data_map_mx_sends_numbers_as_strings() {
        let data = record_data_map(RecordType::Mx, "10 mail.example.com.");
        assert_eq!(data["preference"], "10");
        assert_eq!(data["exchange"], "mail.example.com.");
    }

    #[test]
    fn test_record_data_map_srv_fields() {
        let data = record_data_map(RecordType::Srv, "10 60 5060 sip.example.com.");
        assert_eq!(data["priority"], "10");
        assert_eq!(data["weight"], "60");
        assert_eq!(data["port"], "5060");
        assert_eq!(data["target"], "sip.example.com.");
    }

    #[test]
    fn test_record_data_map_ns_uses_nameserver_key() {
        let data = record_data_map(RecordType::Ns, "ns1.example.com.");
        assert_eq!(data["nameserver"], "ns1.example.com.");
    }

    #[test]
    fn test_record_data_map_txt_strips_quotes() {
        let data = record_data_map(RecordType::Txt, "\"v=spf1 -all\"");
        assert_eq!(data["text"], "v=spf1 -all");
    }

    #[test]
    fn test_record_data_map_opaque_falls_back_to_rdata() {
        let data = record_data_map(RecordType::Tlsa, "3 1 1 d2abde240d");
        assert_eq!(data.len(), 1);
        assert_eq!(data["rdata"], "3 1 1 d2abde240d");
    }

    #[test]
    fn test_record_data_map_undecodable_falls_back_to_rdata() {
        let data = record_data_map(RecordType::Mx, "not-a-priority mail.example.com.");
        assert_eq!(data.len(), 1);
        assert_eq!(data["rdata"], "not-a-priority mail.example.com.");
    }
}
