// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use dealdesk_app::{Deal, DealId, Stage};
use dealdesk_store::{DealPatch, Store};

pub struct StoreRuntime<'a> {
    store: &'a Store,
}

impl<'a> StoreRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl dealdesk_tui::AppRuntime for StoreRuntime<'_> {
    fn load_deals(&mut self) -> Result<Vec<Deal>> {
        Ok(self.store.load())
    }

    fn create_deal(&mut self, deal: Deal) -> Result<Vec<Deal>> {
        self.store.create(deal)
    }

    fn move_deal(&mut self, id: &DealId, target: Stage) -> Result<Vec<Deal>> {
        self.store.update(id, &DealPatch::stage_move(target))
    }

    fn append_deals(&mut self, incoming: Vec<Deal>) -> Result<Vec<Deal>> {
        let mut deals = incoming;
        deals.extend(self.store.load());
        self.store.replace(deals)
    }

    fn replace_deals(&mut self, deals: Vec<Deal>) -> Result<Vec<Deal>> {
        self.store.replace(deals)
    }
}

#[cfg(test)]
mod tests {
    use super::StoreRuntime;
    use anyhow::Result;
    use dealdesk_app::Stage;
    use dealdesk_store::Store;
    use dealdesk_testkit::DealFaker;
    use dealdesk_tui::AppRuntime;
    use time::macros::datetime;

    fn faker() -> DealFaker {
        DealFaker::new(9, datetime!(2026-04-09 12:00 UTC))
    }

    #[test]
    fn move_deal_writes_stage_and_resets_counter() -> Result<()> {
        let store = Store::open_memory();
        let deal = faker().deal_in(Stage::Demo);
        let id = deal.id.clone();
        store.create(deal)?;

        let mut runtime = StoreRuntime::new(&store);
        let deals = runtime.move_deal(&id, Stage::Negotiation)?;
        assert_eq!(deals[0].stage, Stage::Negotiation);
        assert_eq!(deals[0].days_in_stage, 0);
        Ok(())
    }

    #[test]
    fn append_prepends_incoming_rows_in_order() -> Result<()> {
        let store = Store::open_memory();
        let mut faker = faker();
        let existing = faker.deal();
        let existing_id = existing.id.clone();
        store.create(existing)?;

        let first = faker.deal();
        let second = faker.deal();
        let first_id = first.id.clone();
        let second_id = second.id.clone();

        let mut runtime = StoreRuntime::new(&store);
        let deals = runtime.append_deals(vec![first, second])?;
        let ids: Vec<_> = deals.iter().map(|deal| deal.id.clone()).collect();
        assert_eq!(ids, vec![first_id, second_id, existing_id]);
        Ok(())
    }

    #[test]
    fn replace_discards_existing_deals() -> Result<()> {
        let store = Store::open_memory();
        let mut faker = faker();
        store.create(faker.deal())?;
        store.create(faker.deal())?;

        let incoming = vec![faker.deal()];
        let mut runtime = StoreRuntime::new(&store);
        let deals = runtime.replace_deals(incoming.clone())?;
        assert_eq!(deals, incoming);
        assert_eq!(store.load(), incoming);
        Ok(())
    }

    #[test]
    fn replace_import_of_one_row_csv_yields_exactly_that_deal() -> Result<()> {
        let store = Store::open_memory();
        store.create(faker().deal())?;

        let csv = "Company,Description,Value,Stage,Priority,Probability\n\
                   \"Acme\",\"Widget\",1000,Proposal,high,60\n";
        let rows = dealdesk_app::csv::parse_csv(csv, datetime!(2026-04-09 10:30 UTC))?;

        let mut runtime = StoreRuntime::new(&store);
        let deals = runtime.replace_deals(rows)?;
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].company, "Acme");
        assert_eq!(deals[0].value_cents, 100_000);
        assert_eq!(deals[0].stage, Stage::Proposal);
        assert_eq!(store.load(), deals);
        Ok(())
    }

    #[test]
    fn load_reflects_store_state() -> Result<()> {
        let store = Store::open_memory();
        let mut runtime = StoreRuntime::new(&store);
        assert!(runtime.load_deals()?.is_empty());

        runtime.create_deal(faker().deal())?;
        assert_eq!(runtime.load_deals()?.len(), 1);
        Ok(())
    }
}
