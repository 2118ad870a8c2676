// src/records/merge.rs
use std::collections::HashMap;
use std::hash::Hash;

use crate::records::models::BankRecord;
use crate::utils::domain::normalize_domain;

/// Folds records into one by concatenating each collection in input order.
///
/// The result takes the first record's domain. A collection stays `None` only
/// if it is `None` in every input. Returns `None` for an empty input, since
/// there is no domain to anchor the result.
pub fn merge_records<I>(records: I) -> Option<BankRecord>
where
    I: IntoIterator<Item = BankRecord>,
{
    let mut records = records.into_iter();
    let mut merged = records.next()?;
    for record in records {
        absorb(&mut merged, record);
    }
    Some(merged)
}

/// Groups records by key and folds each group with [`merge_records`].
///
/// Groups come out in order of the first occurrence of their key; members are
/// folded in input order.
pub fn merge_by_key<K, I>(keyed: I) -> Vec<(K, BankRecord)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = (K, BankRecord)>,
{
    let mut order: Vec<K> = Vec::new();
    let mut groups: HashMap<K, Vec<BankRecord>> = HashMap::new();

    for (key, record) in keyed {
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(record);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let members = groups.remove(&key)?;
            merge_records(members).map(|merged| (key, merged))
        })
        .collect()
}

/// Consolidates page-level records into one record per normalized domain.
/// Each merged record keeps the raw domain of its first member.
pub fn merge_by_domain(pages: Vec<BankRecord>) -> Vec<BankRecord> {
    let keyed = pages
        .into_iter()
        .map(|page| (normalize_domain(&page.bank_root_domain), page));

    merge_by_key(keyed)
        .into_iter()
        .map(|(_, record)| record)
        .collect()
}

/// Finds the record for `domain` using the same normalization as merging,
/// so `www.dcu.org` and `dcu.org` both match.
pub fn find_by_domain<'a>(records: &'a [BankRecord], domain: &str) -> Option<&'a BankRecord> {
    let wanted = normalize_domain(domain);
    records
        .iter()
        .find(|record| normalize_domain(&record.bank_root_domain) == wanted)
}

fn absorb(into: &mut BankRecord, from: BankRecord) {
    concat(&mut into.checking_accounts, from.checking_accounts);
    concat(&mut into.savings_accounts, from.savings_accounts);
    concat(&mut into.money_market_accounts, from.money_market_accounts);
    concat(&mut into.certificates_of_deposit, from.certificates_of_deposit);
    concat(&mut into.individual_retirement_accounts, from.individual_retirement_accounts);
    concat(&mut into.loans, from.loans);
    concat(&mut into.credit_cards, from.credit_cards);
    concat(&mut into.fees, from.fees);
}

fn concat<T>(into: &mut Option<Vec<T>>, from: Option<Vec<T>>) {
    if let Some(items) = from {
        into.get_or_insert_with(Vec::new).extend(items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::models::{CertificateOfDeposit, Fee};

    fn cd(term: &str, apy: f64) -> CertificateOfDeposit {
        CertificateOfDeposit {
            term: term.to_string(),
            interest_rate: None,
            annual_percentage_yield: apy,
            minimum_balance_to_obtain_apy: None,
            minimum_balance_to_open: None,
            minimum_daily_balance: None,
        }
    }

    fn with_cds(domain: &str, cds: Vec<CertificateOfDeposit>) -> BankRecord {
        let mut record = BankRecord::empty(domain);
        record.certificates_of_deposit = Some(cds);
        record
    }

    fn terms(record: &BankRecord) -> Vec<&str> {
        record
            .certificates_of_deposit
            .iter()
            .flatten()
            .map(|c| c.term.as_str())
            .collect()
    }

    #[test]
    fn test_merge_of_nothing_is_none() {
        assert!(merge_records(Vec::new()).is_none());
        assert!(merge_by_key(Vec::<(String, BankRecord)>::new()).is_empty());
    }

    #[test]
    fn test_merge_preserves_input_order() {
        let a = with_cds("bank.example.com", vec![cd("6-month", 4.0), cd("9-month", 4.1)]);
        let b = BankRecord::empty("bank.example.com");
        let c = with_cds("www.bank.example.com", vec![cd("12-month", 4.5)]);

        let merged = merge_records(vec![a.clone(), b.clone(), c.clone()]).unwrap();
        assert_eq!(merged.bank_root_domain, "bank.example.com");
        assert_eq!(terms(&merged), vec!["6-month", "9-month", "12-month"]);

        let reversed = merge_records(vec![c, b, a]).unwrap();
        assert_eq!(reversed.bank_root_domain, "www.bank.example.com");
        assert_eq!(terms(&reversed), vec!["12-month", "6-month", "9-month"]);
    }

    #[test]
    fn test_merge_does_not_deduplicate() {
        let a = with_cds("bank.example.com", vec![cd("12-month CD", 4.5)]);
        let b = with_cds("bank.example.com", vec![cd("12-month CD", 4.5)]);
        let merged = merge_records(vec![a, b]).unwrap();
        assert_eq!(terms(&merged), vec!["12-month CD", "12-month CD"]);
    }

    #[test]
    fn test_absent_and_empty_collections_merge_cleanly() {
        let absent = BankRecord::empty("bank.example.com");
        let mut empty = BankRecord::empty("bank.example.com");
        empty.fees = Some(Vec::<Fee>::new());

        let merged = merge_records(vec![absent.clone(), empty.clone()]).unwrap();
        assert_eq!(merged.fees, Some(vec![]));
        assert_eq!(merged.item_count(), 0);

        let merged = merge_records(vec![empty, absent.clone()]).unwrap();
        assert_eq!(merged.fees, Some(vec![]));

        let merged = merge_records(vec![absent.clone(), absent]).unwrap();
        assert!(merged.fees.is_none());
        assert!(merged.loans.is_none());
    }

    #[test]
    fn test_merge_by_key_groups_in_first_seen_order() {
        let keyed = vec![
            ("b".to_string(), with_cds("b.com", vec![cd("b1", 1.0)])),
            ("a".to_string(), with_cds("a.com", vec![cd("a1", 1.0)])),
            ("b".to_string(), with_cds("b.com", vec![cd("b2", 1.0)])),
        ];
        let merged = merge_by_key(keyed);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].0, "b");
        assert_eq!(terms(&merged[0].1), vec!["b1", "b2"]);
        assert_eq!(merged[1].0, "a");
        assert_eq!(terms(&merged[1].1), vec!["a1"]);
    }

    #[test]
    fn test_merge_by_domain_groups_www_and_bare_hosts() {
        let pages = vec![
            with_cds("www.bank.example.com", vec![cd("12-month", 4.5)]),
            with_cds("other.example", vec![cd("3-month", 3.0)]),
            with_cds("bank.example.com", vec![cd("24-month", 4.25)]),
        ];
        let merged = merge_by_domain(pages);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].bank_root_domain, "www.bank.example.com");
        assert_eq!(terms(&merged[0]), vec!["12-month", "24-month"]);
        assert_eq!(merged[1].bank_root_domain, "other.example");
    }

    #[test]
    fn test_single_page_domain_merge_is_unchanged() {
        let page = with_cds("bank.example.com", vec![cd("12-month", 4.5), cd("24-month", 4.25)]);
        let merged = merge_by_domain(vec![page.clone()]);
        assert_eq!(merged, vec![page]);
    }

    #[test]
    fn test_find_by_domain() {
        let records = vec![
            with_cds("dcu.org", vec![cd("12-month", 4.5)]),
            with_cds("www.huntington.com", vec![cd("7-month", 5.0)]),
        ];

        assert_eq!(find_by_domain(&records, "www.dcu.org").unwrap().bank_root_domain, "dcu.org");
        assert_eq!(
            find_by_domain(&records, "huntington.com").unwrap().bank_root_domain,
            "www.huntington.com"
        );
        assert!(find_by_domain(&records, "parkbank.bank").is_none());
    }
}
