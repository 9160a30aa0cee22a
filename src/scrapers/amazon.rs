use crate::error::{Result, ScrapeError};
use crate::models::{ProductRecord, SearchRequest, TIMESTAMP_FORMAT};
use crate::scrapers::traits::FetchedPage;
use chrono::Local;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

const LOW_RES_IMAGE_SUFFIX: &str = "_AC_UY218_.jpg";
const HIGH_RES_IMAGE_SUFFIX: &str = "_AC_UY654_FMwebp_QL65_.jpg";

/// Tracking marker appended to product links on listing pages
const TRACKING_MARKER: &str = "ref=sr";

macro_rules! selector {
    ($css:expr) => {
        LazyLock::new(|| Selector::parse($css).expect("valid CSS selector"))
    };
}

static PRODUCT: LazyLock<Selector> = selector!(r#"[data-component-type="s-search-result"]"#);
static TITLE: LazyLock<Selector> = selector!("h2");
static STARS: LazyLock<Selector> = selector!("i");
static REVIEWS: LazyLock<Selector> = selector!(".a-size-base.s-underline-text");
static SECONDARY_TEXT: LazyLock<Selector> = selector!("span.a-size-base.a-color-secondary");
static CURRENT_PRICE: LazyLock<Selector> = selector!(".a-price .a-offscreen");
static WAS_PRICE: LazyLock<Selector> = selector!(".a-text-price .a-offscreen");
static SPAN: LazyLock<Selector> = selector!("span");
static IMAGE: LazyLock<Selector> = selector!(".s-image[srcset]");
static TITLE_LINK: LazyLock<Selector> = selector!(r#"[data-cy="title-recipe"] a"#);

/// Build the search URL for a keyword: `{base_url}/s?k={keyword}`
pub fn build_search_request(base_url: &str, query: &str) -> Result<SearchRequest> {
    let raw = format!(
        "{}/s?k={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(query)
    );
    let url = Url::parse(&raw).map_err(|e| ScrapeError::configuration(base_url, e))?;

    Ok(SearchRequest {
        query: query.to_string(),
        url,
    })
}

/// Outcome of extracting one product block
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Product(ProductRecord),
    /// Block had no title; carries what was extracted for the skip log
    Skipped(ProductRecord),
}

/// A parsed search listing page
pub struct ListingPage {
    document: Html,
    url: Url,
}

impl ListingPage {
    pub fn parse(page: &FetchedPage) -> Self {
        Self {
            document: Html::parse_document(&page.body),
            url: page.url.clone(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Lazily extract every product block on the page, in document order
    pub fn products(&self) -> impl Iterator<Item = Result<Extracted>> + '_ {
        self.document
            .select(&PRODUCT)
            .map(move |block| extract_product(block, &self.url))
    }
}

fn extract_product(block: ElementRef<'_>, page_url: &Url) -> Result<Extracted> {
    let current_price = first_text(block, &CURRENT_PRICE);
    let was_price = first_text(block, &WAS_PRICE);
    let (discounted_price, price) = resolve_prices(current_price, was_price);

    let image = block
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::trim)
        .unwrap_or_default();

    let href = block
        .select(&TITLE_LINK)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(strip_tracking)
        .unwrap_or_default();

    let product_url = if href.is_empty() {
        String::new()
    } else {
        page_url
            .join(href)
            .map_err(|e| ScrapeError::Extraction {
                url: page_url.to_string(),
                reason: format!("bad product link {:?}: {}", href, e),
            })?
            .to_string()
    };

    let record = ProductRecord {
        title: first_text(block, &TITLE),
        stars_ranking: first_text(block, &STARS),
        total_reviews: first_text(block, &REVIEWS),
        last_month_sold: bought_last_month(block),
        discounted_price,
        price,
        delivery: delivery_text(block),
        image_url: upscale_image_url(image),
        product_url,
        timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
    };

    if record.has_title() {
        Ok(Extracted::Product(record))
    } else {
        Ok(Extracted::Skipped(record))
    }
}

/// Returns `(discounted_price, price)`.
///
/// With a struck-through price present the current price is the discount and
/// the struck-through one is the regular price. Otherwise there is no discount.
pub fn resolve_prices(current: String, was: String) -> (String, String) {
    if was.is_empty() {
        (String::new(), current)
    } else {
        (current, was)
    }
}

/// Swap the thumbnail suffix for the large webp rendition
pub fn upscale_image_url(url: &str) -> String {
    match url.strip_suffix(LOW_RES_IMAGE_SUFFIX) {
        Some(stem) => format!("{}{}", stem, HIGH_RES_IMAGE_SUFFIX),
        None => url.to_string(),
    }
}

fn strip_tracking(href: &str) -> &str {
    href.split(TRACKING_MARKER).next().unwrap_or_default()
}

fn first_text(block: ElementRef<'_>, selector: &Selector) -> String {
    block
        .select(selector)
        .flat_map(|el| el.text())
        .map(str::trim)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn bought_last_month(block: ElementRef<'_>) -> String {
    block
        .select(&SECONDARY_TEXT)
        .flat_map(|el| el.text())
        .filter(|text| text.contains("bought"))
        .collect()
}

/// Text of the span right after the one labelled "Delivery"
fn delivery_text(block: ElementRef<'_>) -> String {
    block
        .select(&SPAN)
        .filter(|span| span.text().any(|t| t.contains("Delivery")))
        .find_map(|label| {
            label
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .next()
                .filter(|sibling| sibling.value().name() == "span")
        })
        .map(|span| span.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}
