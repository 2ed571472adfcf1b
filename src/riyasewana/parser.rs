use crate::RawListing;
use lazy_regex::regex;
use lazy_static::lazy_static;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

const E: &str = "Invalid selector";
lazy_static! {
    static ref ITEM: Selector = Selector::parse(".item").expect(E);
    static ref A: Selector = Selector::parse("a").expect(E);
    static ref CELL: Selector = Selector::parse(".boxintxt").expect(E);
}

fn text_of(el: ElementRef) -> String {
    let text = el.text().collect::<String>();
    regex!(r"\s+").replace_all(text.trim(), " ").into_owned()
}

/// Reads every `.item` on a search results page.
///
/// The first anchor carries the title and link. The `.boxintxt` cells hold location, price,
/// distance and publish date, in that order. Missing pieces come back as empty strings.
pub fn parse_listings(doc: &Html, base: &Url) -> Vec<RawListing> {
    doc.select(&ITEM)
        .map(|item| {
            let anchor = item.select(&A).next();
            let r#type = anchor.map(text_of).unwrap_or_default();
            let link = anchor
                .and_then(|a| a.value().attr("href"))
                .map(str::trim)
                .and_then(|href| base.join(href).ok())
                .map(String::from)
                .unwrap_or_default();

            let mut cells = item.select(&CELL).map(text_of);
            let mut next_cell = || cells.next().unwrap_or_default();

            RawListing {
                r#type,
                location: next_cell(),
                price: next_cell(),
                distance: next_cell(),
                ad_published: next_cell(),
                link,
            }
        })
        .collect()
}
