//! Property tests for the payload split and pair fusion.

use optical_hybrid_scan::{
    cipher::{decrypt, seal, DecryptError, Salt},
    fusion::PairFusion,
    keys::MasterKey,
};
use proptest::prelude::*;

fn master() -> MasterKey {
    MasterKey::from_bytes(b"AX25HBKF".to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn split_anywhere_decrypts(
        secret in "[a-zA-Z0-9 #!]{4,40}",
        salt in any::<[u8; 16]>(),
        cut in any::<prop::sample::Index>(),
    ) {
        let sealed = seal(&master(), Salt::from_bytes(salt), &secret).unwrap();
        let at = 1 + cut.index(sealed.ciphertext_b64().len() - 1);
        let pair = sealed.split(at).unwrap();

        prop_assert_eq!(decrypt(&pair.matrix, &pair.linear, &master()).unwrap(), secret);
    }

    #[test]
    fn other_key_never_yields_secret(
        secret in "[a-z]{4,24}",
        salt in any::<[u8; 16]>(),
        wrong in "[A-Z0-9]{8}",
    ) {
        prop_assume!(wrong != "AX25HBKF");
        let pair = seal(&master(), Salt::from_bytes(salt), &secret)
            .unwrap()
            .split_even()
            .unwrap();

        let result = decrypt(&pair.matrix, &pair.linear, &MasterKey::from_bytes(wrong.into_bytes()));
        prop_assert_ne!(result.ok(), Some(secret));
    }

    #[test]
    fn matrix_without_one_separator_is_malformed(
        matrix in "[0-9a-f]{0,40}",
        linear in "[A-Za-z0-9+/]{0,24}",
    ) {
        prop_assert!(matches!(
            decrypt(&matrix, &linear, &master()),
            Err(DecryptError::MalformedPayload(_))
        ));
    }

    #[test]
    fn fusion_never_repeats_a_pair(
        ticks in prop::collection::vec(
            (prop::option::of(0u8..3), prop::option::of(0u8..3)),
            1..60,
        ),
    ) {
        let mut fusion = PairFusion::new();
        let mut previous: Option<(String, String)> = None;

        for (m, l) in ticks {
            let matrix = m.map(|v| format!("m{}", v));
            let linear = l.map(|v| format!("l{}", v));

            if let Some(pair) = fusion.tick(matrix.as_deref(), linear.as_deref()) {
                let current = (pair.matrix.clone(), pair.linear.clone());
                prop_assert_ne!(previous.as_ref(), Some(&current));
                previous = Some(current);
            }
        }
    }

    #[test]
    fn fusion_only_pairs_observed_values(
        ticks in prop::collection::vec(
            (prop::option::of("[a-c]{1,2}"), prop::option::of("[x-z]{1,2}")),
            1..40,
        ),
    ) {
        let mut fusion = PairFusion::new();
        let mut seen_matrix = Vec::new();
        let mut seen_linear = Vec::new();

        for (m, l) in ticks {
            seen_matrix.extend(m.clone());
            seen_linear.extend(l.clone());

            if let Some(pair) = fusion.tick(m.as_deref(), l.as_deref()) {
                prop_assert!(seen_matrix.contains(&pair.matrix));
                prop_assert!(seen_linear.contains(&pair.linear));
            }
        }
    }
}
