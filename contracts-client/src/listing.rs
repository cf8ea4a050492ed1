//! Contract listing: the full set fetched once, filtered and paged on demand.
//!
//! The filtered projection is recomputed after every mutation from
//! [`apply_filters`], so the view-model never holds a stale derivation.

use tracing::{debug, info, warn};

use crate::{
    error::Result,
    gateway::ContractsGateway,
    models::{Contract, ContractStatus, RiskLevel},
};

pub const PAGE_SIZE: usize = 10;

/// The three listing predicates. A `None` (or empty search) matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractFilter {
    pub search: String,
    pub status: Option<ContractStatus>,
    pub risk: Option<RiskLevel>,
}

impl ContractFilter {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.status.is_some() || self.risk.is_some()
    }

    pub fn matches(&self, contract: &Contract) -> bool {
        self.matches_search(contract)
            && self.status.is_none_or(|status| contract.status == status)
            && self.risk.is_none_or(|risk| contract.risk == risk)
    }

    fn matches_search(&self, contract: &Contract) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        contract.name.to_lowercase().contains(&needle)
            || contract.parties.to_lowercase().contains(&needle)
    }
}

pub fn apply_filters<'a>(contracts: &'a [Contract], filter: &ContractFilter) -> Vec<&'a Contract> {
    contracts
        .iter()
        .filter(|contract| filter.matches(contract))
        .collect()
}

/// Items `[(page-1)*page_size, page*page_size)`; empty when out of range.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn total_pages(item_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        item_count.div_ceil(page_size)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    pub total: usize,
    pub active: usize,
    pub renewal_due: usize,
    pub high_risk: usize,
}

impl SummaryCounts {
    pub fn from_contracts(contracts: &[Contract]) -> Self {
        contracts.iter().fold(
            SummaryCounts {
                total: contracts.len(),
                ..Default::default()
            },
            |mut counts, contract| {
                match contract.status {
                    ContractStatus::Active => counts.active += 1,
                    ContractStatus::RenewalDue => counts.renewal_due += 1,
                    ContractStatus::Expired => {}
                }
                if contract.risk == RiskLevel::High {
                    counts.high_risk += 1;
                }
                counts
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    /// 1-based.
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<&'a Contract>,
}

impl Page<'_> {
    /// 1-based position of the first item shown, 0 when the page is empty.
    pub fn first_item(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.number - 1) * PAGE_SIZE + 1
        }
    }

    pub fn last_item(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.first_item() + self.items.len() - 1
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    /// Nothing has been uploaded yet.
    NoContracts,
    /// Contracts exist but the filters exclude all of them.
    NoMatches { search: Option<String> },
}

#[derive(Debug, Clone, Default)]
pub struct ListingViewModel {
    contracts: Vec<Contract>,
    filter: ContractFilter,
    filtered: Vec<usize>,
    current_page: usize,
    last_error: Option<String>,
}

impl ListingViewModel {
    pub fn new() -> Self {
        Self::with_contracts(Vec::new())
    }

    pub fn with_contracts(contracts: Vec<Contract>) -> Self {
        let mut listing = Self {
            current_page: 1,
            ..Default::default()
        };
        listing.set_contracts(contracts);
        listing
    }

    /// Fetches the full list. On failure the previous list is kept and the
    /// message is available from [`ListingViewModel::last_error`].
    pub async fn refresh(&mut self, gateway: &dyn ContractsGateway) -> Result<()> {
        match gateway.list_contracts().await {
            Ok(contracts) => {
                info!("Loaded {} contracts", contracts.len());
                self.set_contracts(contracts);
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Unable to load contracts: {}", e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn set_contracts(&mut self, contracts: Vec<Contract>) {
        self.contracts = contracts;
        self.rederive();
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if self.filter.search != search {
            self.filter.search = search;
            self.rederive();
        }
    }

    pub fn set_status_filter(&mut self, status: Option<ContractStatus>) {
        if self.filter.status != status {
            self.filter.status = status;
            self.rederive();
        }
    }

    pub fn set_risk_filter(&mut self, risk: Option<RiskLevel>) {
        if self.filter.risk != risk {
            self.filter.risk = risk;
            self.rederive();
        }
    }

    pub fn set_filter(&mut self, filter: ContractFilter) {
        if self.filter != filter {
            self.filter = filter;
            self.rederive();
        }
    }

    pub fn clear_filters(&mut self) {
        self.set_filter(ContractFilter::default());
    }

    fn rederive(&mut self) {
        self.filtered = self
            .contracts
            .iter()
            .enumerate()
            .filter(|(_, contract)| self.filter.matches(contract))
            .map(|(index, _)| index)
            .collect();
        self.current_page = 1;
        debug!(
            total = self.contracts.len(),
            visible = self.filtered.len(),
            filter = ?self.filter,
            "Listing re-derived"
        );
    }

    pub fn contracts(&self) -> &[Contract] {
        &self.contracts
    }

    pub fn find(&self, id: &str) -> Option<&Contract> {
        self.contracts.iter().find(|contract| contract.id == id)
    }

    pub fn filter(&self) -> &ContractFilter {
        &self.filter
    }

    pub fn filtered(&self) -> Vec<&Contract> {
        self.filtered.iter().map(|&index| &self.contracts[index]).collect()
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered.len(), PAGE_SIZE)
    }

    /// Always within `1..=max(total_pages, 1)`.
    pub fn current_page(&self) -> usize {
        self.current_page.clamp(1, self.total_pages().max(1))
    }

    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.current_page = page.clamp(1, self.total_pages().max(1));
        self.current_page
    }

    pub fn next_page(&mut self) -> usize {
        self.go_to_page(self.current_page() + 1)
    }

    pub fn previous_page(&mut self) -> usize {
        self.go_to_page(self.current_page().saturating_sub(1))
    }

    pub fn page(&self) -> Page<'_> {
        let number = self.current_page();
        let items = paginate(&self.filtered, number, PAGE_SIZE)
            .iter()
            .map(|&index| &self.contracts[index])
            .collect();

        Page {
            number,
            total_pages: self.total_pages(),
            total_items: self.filtered.len(),
            items,
        }
    }

    /// Counters over the unfiltered list.
    pub fn summary(&self) -> SummaryCounts {
        SummaryCounts::from_contracts(&self.contracts)
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        if !self.filtered.is_empty() {
            None
        } else if self.contracts.is_empty() {
            Some(EmptyState::NoContracts)
        } else {
            let search = Some(self.filter.search.clone()).filter(|s| !s.is_empty());
            Some(EmptyState::NoMatches { search })
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedGateway, contract};

    fn portfolio(count: usize) -> Vec<Contract> {
        (0..count)
            .map(|i| {
                let status = ContractStatus::ALL[i % 3];
                let risk = RiskLevel::ALL[(i / 3) % 3];
                contract(
                    &format!("c{}", i),
                    &format!("Agreement {}", i),
                    if i % 2 == 0 { "Acme Corp, Globex" } else { "Initech, Umbrella" },
                    status,
                    risk,
                )
            })
            .collect()
    }

    #[test]
    fn status_filter_keeps_only_matching() {
        let contracts = vec![
            contract("1", "MSA", "A, B", ContractStatus::Active, RiskLevel::High),
            contract("2", "NDA", "C, D", ContractStatus::Expired, RiskLevel::Low),
        ];
        let mut listing = ListingViewModel::with_contracts(contracts);
        listing.set_status_filter(Some(ContractStatus::Active));

        let filtered = listing.filtered();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "1");
    }

    #[test]
    fn search_matches_name_or_parties_case_insensitively() {
        let contracts = vec![
            contract("1", "Master Services", "Acme, Globex", ContractStatus::Active, RiskLevel::Low),
            contract("2", "Lease", "ACME Realty", ContractStatus::Active, RiskLevel::Low),
            contract("3", "Supply", "Initech", ContractStatus::Active, RiskLevel::Low),
        ];
        let mut listing = ListingViewModel::with_contracts(contracts);

        listing.set_search("acme");
        let ids: Vec<&str> = listing.filtered().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);

        listing.set_search("SERVICES");
        let ids: Vec<&str> = listing.filtered().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn all_active_predicates_must_pass() {
        let contracts = portfolio(30);
        let filter = ContractFilter {
            search: "globex".to_string(),
            status: Some(ContractStatus::RenewalDue),
            risk: Some(RiskLevel::Medium),
        };

        for contract in apply_filters(&contracts, &filter) {
            assert!(contract.parties.contains("Globex"));
            assert_eq!(contract.status, ContractStatus::RenewalDue);
            assert_eq!(contract.risk, RiskLevel::Medium);
        }
        let expected = contracts
            .iter()
            .filter(|c| {
                c.parties.contains("Globex")
                    && c.status == ContractStatus::RenewalDue
                    && c.risk == RiskLevel::Medium
            })
            .count();
        assert_eq!(apply_filters(&contracts, &filter).len(), expected);
    }

    #[test]
    fn filtering_is_idempotent() {
        let contracts = portfolio(25);
        let filter = ContractFilter {
            search: "agreement 1".to_string(),
            status: None,
            risk: Some(RiskLevel::Low),
        };
        assert_eq!(
            apply_filters(&contracts, &filter),
            apply_filters(&contracts, &filter)
        );
    }

    #[test]
    fn pages_partition_the_filtered_list() {
        let mut listing = ListingViewModel::with_contracts(portfolio(47));
        listing.set_risk_filter(Some(RiskLevel::Low));
        let filtered: Vec<String> = listing.filtered().iter().map(|c| c.id.clone()).collect();

        let mut seen = Vec::new();
        for page in 1..=listing.total_pages() {
            listing.go_to_page(page);
            let current = listing.page();
            assert!(current.items.len() <= PAGE_SIZE);
            seen.extend(current.items.iter().map(|c| c.id.clone()));
        }
        assert_eq!(seen, filtered);
    }

    #[test]
    fn page_resets_when_filters_or_list_change() {
        let mut listing = ListingViewModel::with_contracts(portfolio(35));
        listing.go_to_page(3);
        assert_eq!(listing.current_page(), 3);

        listing.set_search("agreement");
        assert_eq!(listing.current_page(), 1);

        listing.go_to_page(2);
        listing.set_contracts(portfolio(35));
        assert_eq!(listing.current_page(), 1);

        // same value is not a change
        listing.go_to_page(2);
        listing.set_search("agreement");
        assert_eq!(listing.current_page(), 2);
    }

    #[test]
    fn navigation_clamps_to_available_pages() {
        let mut listing = ListingViewModel::with_contracts(portfolio(21));
        assert_eq!(listing.total_pages(), 3);

        assert_eq!(listing.go_to_page(99), 3);
        assert_eq!(listing.next_page(), 3);
        assert!(!listing.page().has_next());

        assert_eq!(listing.go_to_page(0), 1);
        assert_eq!(listing.previous_page(), 1);
        assert!(!listing.page().has_previous());

        let empty = ListingViewModel::new();
        assert_eq!(empty.current_page(), 1);
        assert!(empty.page().items.is_empty());
    }

    #[test]
    fn page_reports_visible_range() {
        let mut listing = ListingViewModel::with_contracts(portfolio(23));
        listing.go_to_page(3);
        let page = listing.page();
        assert_eq!((page.first_item(), page.last_item(), page.total_items), (21, 23, 23));
    }

    #[test]
    fn summary_ignores_filters() {
        let mut listing = ListingViewModel::with_contracts(portfolio(12));
        let before = listing.summary();
        listing.set_status_filter(Some(ContractStatus::Expired));
        listing.set_search("nothing matches this");

        assert_eq!(listing.summary(), before);
        assert_eq!(
            before,
            SummaryCounts {
                total: 12,
                active: 4,
                renewal_due: 4,
                high_risk: 3,
            }
        );
    }

    #[test]
    fn empty_states_distinguish_no_data_from_no_matches() {
        let mut listing = ListingViewModel::new();
        assert_eq!(listing.empty_state(), Some(EmptyState::NoContracts));

        listing.set_contracts(portfolio(3));
        assert_eq!(listing.empty_state(), None);

        listing.set_search("zzz");
        assert_eq!(
            listing.empty_state(),
            Some(EmptyState::NoMatches { search: Some("zzz".to_string()) })
        );

        listing.set_search("");
        listing.set_risk_filter(Some(RiskLevel::High));
        assert_eq!(
            listing.empty_state(),
            Some(EmptyState::NoMatches { search: None })
        );

        listing.clear_filters();
        assert_eq!(listing.filtered_len(), 3);
    }

    #[test]
    fn paginate_handles_out_of_range() {
        let items = [1, 2, 3];
        assert_eq!(paginate(&items, 1, 2), &[1, 2]);
        assert_eq!(paginate(&items, 2, 2), &[3]);
        assert!(paginate(&items, 3, 2).is_empty());
        assert!(paginate(&items, 0, 2).is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list() {
        let mut listing = ListingViewModel::new();
        listing
            .refresh(&ScriptedGateway::new().with_contracts(portfolio(4)))
            .await
            .unwrap();
        assert_eq!(listing.contracts().len(), 4);

        let err = listing
            .refresh(&ScriptedGateway::new().failing_list("Could not validate credentials"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not validate credentials");
        assert_eq!(listing.last_error(), Some("Could not validate credentials"));
        assert_eq!(listing.contracts().len(), 4);
    }
}
