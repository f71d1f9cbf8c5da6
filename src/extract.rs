use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static LISTING_CONTAINER: Lazy<Selector> = Lazy::new(|| sel("div.infinite-container"));
static PAPER_CARD: Lazy<Selector> = Lazy::new(|| sel("div.row.infinite-item.item.paper-card"));
static CARD_LINK: Lazy<Selector> = Lazy::new(|| sel("div.item-image-col a"));
static CARD_IMAGE: Lazy<Selector> = Lazy::new(|| sel("div.item-image"));
static CARD_STRIP_ABSTRACT: Lazy<Selector> = Lazy::new(|| sel("p.item-strip-abstract"));
static CARD_CODE_BADGE: Lazy<Selector> = Lazy::new(|| sel("span.item-github-link a"));
static CARD_INTERACT: Lazy<Selector> = Lazy::new(|| sel("div.item-interact"));
static CARD_ENTITY_STARS: Lazy<Selector> = Lazy::new(|| sel("span.badge.badge-secondary"));
static CARD_STARS_ACCUMULATED: Lazy<Selector> = Lazy::new(|| sel("div.stars-accumulated"));

static DETAIL_TITLE: Lazy<Selector> = Lazy::new(|| sel("div.paper-title h1"));
static DETAIL_AUTHORS: Lazy<Selector> = Lazy::new(|| sel("div.authors"));
static DETAIL_AUTHOR_SPAN: Lazy<Selector> = Lazy::new(|| sel("span.author-span"));
static DETAIL_ABSTRACT: Lazy<Selector> = Lazy::new(|| sel("div.paper-abstract"));
static DETAIL_TASKS: Lazy<Selector> = Lazy::new(|| sel("div.paper-tasks a"));
static DETAIL_CODE_LIST: Lazy<Selector> = Lazy::new(|| sel("div#implementations-short-list"));
static CODE_TABLE_LINK: Lazy<Selector> = Lazy::new(|| sel("a.code-table-link"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| sel("a"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| sel("p"));

static COVER_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"url\((.*?)\)").expect("valid cover url regex"));

/// Fields pulled from one summary card on a listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogCard {
    pub detail_path: String,
    pub cover_img: String,
    pub strip_abstract: String,
    pub gitlab: String,
    pub entity_stars: String,
    pub stars_accumulated: String,
}

/// Fields pulled from one paper's detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailFields {
    pub title: String,
    pub authors: String,
    pub date: String,
    pub abstract_text: String,
    pub arxiv_url: String,
    pub paper_task: Vec<String>,
    pub code: Vec<String>,
}

fn missing(what: &str) -> String {
    format!("missing expected element: {what}")
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_required<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
    what: &str,
) -> Result<ElementRef<'a>, String> {
    scope.select(selector).next().ok_or_else(|| missing(what))
}

/// Pulls the cover image URL out of an inline `background-image: url(...)`
/// style. Absent or malformed styles are not an error, just no cover.
pub fn parse_cover_url(style: &str) -> String {
    COVER_URL_RE
        .captures(style)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim_matches(|ch| ch == '\'' || ch == '"').to_string())
        .unwrap_or_default()
}

/// Extracts every summary card from a listing page. The listing container
/// and every per-card field except the cover image are required; a missing
/// one fails the whole page.
pub fn extract_cards(document: &Html) -> Result<Vec<CatalogCard>, String> {
    let container = document
        .select(&LISTING_CONTAINER)
        .next()
        .ok_or_else(|| missing("div.infinite-container"))?;

    let mut cards = Vec::new();
    for item in container.select(&PAPER_CARD) {
        let link = first_required(item, &CARD_LINK, "div.item-image-col a")?;
        let detail_path = link
            .value()
            .attr("href")
            .ok_or_else(|| missing("detail link href"))?
            .to_string();
        let cover_img = item
            .select(&CARD_IMAGE)
            .next()
            .and_then(|image| image.value().attr("style"))
            .map(parse_cover_url)
            .unwrap_or_default();
        let strip_abstract =
            element_text(first_required(item, &CARD_STRIP_ABSTRACT, "p.item-strip-abstract")?);
        let gitlab =
            element_text(first_required(item, &CARD_CODE_BADGE, "span.item-github-link a")?);
        let interact = first_required(item, &CARD_INTERACT, "div.item-interact")?;
        let entity_stars = element_text(first_required(
            interact,
            &CARD_ENTITY_STARS,
            "span.badge.badge-secondary",
        )?);
        let stars_accumulated = element_text(first_required(
            interact,
            &CARD_STARS_ACCUMULATED,
            "div.stars-accumulated",
        )?);

        cards.push(CatalogCard {
            detail_path,
            cover_img,
            strip_abstract,
            gitlab,
            entity_stars,
            stars_accumulated,
        });
    }
    Ok(cards)
}

/// Extracts the full metadata block from a paper detail page.
pub fn extract_detail(document: &Html) -> Result<DetailFields, String> {
    let root = document.root_element();

    let title = element_text(first_required(root, &DETAIL_TITLE, "div.paper-title h1")?);

    let authors_block = first_required(root, &DETAIL_AUTHORS, "div.authors")?;
    let date = element_text(first_required(
        authors_block,
        &DETAIL_AUTHOR_SPAN,
        "div.authors span.author-span",
    )?);
    let authors = authors_block
        .select(&ANCHOR)
        .map(element_text)
        .collect::<Vec<_>>()
        .join(", ");

    let abstract_block = first_required(root, &DETAIL_ABSTRACT, "div.paper-abstract")?;
    let abstract_text =
        element_text(first_required(abstract_block, &PARAGRAPH, "div.paper-abstract p")?);
    let arxiv_url = abstract_block
        .select(&ANCHOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .next()
        .ok_or_else(|| missing("div.paper-abstract a[href]"))?
        .to_string();

    let paper_task = root.select(&DETAIL_TASKS).map(element_text).collect();

    let code_list = first_required(root, &DETAIL_CODE_LIST, "div#implementations-short-list")?;
    let code = code_list
        .select(&CODE_TABLE_LINK)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::to_string)
        .collect();

    Ok(DetailFields {
        title,
        authors,
        date,
        abstract_text,
        arxiv_url,
        paper_task,
        code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_html(cards: &str) -> String {
        format!(
            r#"<html><body>
            <div class="infinite-container text-center home-page">{cards}</div>
            </body></html>"#
        )
    }

    const CARD: &str = r##"
        <div class="row infinite-item item paper-card">
          <div class="col-lg-3 item-image-col">
            <a href="/paper/deep-thing"><div class="item-image"
               style="background-image: url('https://host/img/deep-thing.jpg');"></div></a>
          </div>
          <div class="col-lg-9 item-content">
            <p class="item-strip-abstract"> Deep things considered... </p>
            <span class="item-github-link"><a href="#">12 code implementations</a></span>
          </div>
          <div class="col-lg-3 item-interact text-center">
            <span class="badge badge-secondary"> 1,234 </span>
            <div class="stars-accumulated text-center"> 7 stars / hour </div>
          </div>
        </div>"##;

    const DETAIL: &str = r#"<html><body>
        <div class="paper-title"><h1> Deep Things Considered </h1></div>
        <div class="authors">
          <span class="author-span"> 12 Mar 2024 </span>
          <a href="/author/a"> Ada Lovelace </a>
          <a href="/author/b"> Alan Turing </a>
        </div>
        <div class="paper-abstract">
          <p> Deep things considered, at length. </p>
          <a href="https://arxiv.org/pdf/2403.00001v1.pdf">PDF</a>
        </div>
        <div class="paper-tasks">
          <a href="/task/one"> Image Classification </a>
          <a href="/task/two"> Object Detection </a>
        </div>
        <div id="implementations-short-list">
          <a class="code-table-link" href="https://github.com/example/one">one</a>
          <a class="code-table-link" href="https://github.com/example/two">two</a>
        </div>
        </body></html>"#;

    #[test]
    fn listing_card_fields_are_extracted_and_trimmed() {
        let document = Html::parse_document(&listing_html(CARD));
        let cards = extract_cards(&document).unwrap();
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.detail_path, "/paper/deep-thing");
        assert_eq!(card.cover_img, "https://host/img/deep-thing.jpg");
        assert_eq!(card.strip_abstract, "Deep things considered...");
        assert_eq!(card.gitlab, "12 code implementations");
        assert_eq!(card.entity_stars, "1,234");
        assert_eq!(card.stars_accumulated, "7 stars / hour");
    }

    #[test]
    fn missing_listing_container_fails() {
        let document = Html::parse_document("<html><body></body></html>");
        let err = extract_cards(&document).unwrap_err();
        assert!(err.contains("missing expected element"), "{err}");
        assert!(err.contains("infinite-container"), "{err}");
    }

    #[test]
    fn card_without_style_yields_empty_cover() {
        let card = CARD.replace(r#"style="background-image: url('https://host/img/deep-thing.jpg');""#, "");
        let document = Html::parse_document(&listing_html(&card));
        let cards = extract_cards(&document).unwrap();
        assert_eq!(cards[0].cover_img, "");
    }

    #[test]
    fn malformed_style_yields_empty_cover() {
        assert_eq!(parse_cover_url("background-image: none;"), "");
        assert_eq!(parse_cover_url(""), "");
        assert_eq!(parse_cover_url("url(plain.png)"), "plain.png");
        assert_eq!(parse_cover_url(r#"url("quoted.png")"#), "quoted.png");
    }

    #[test]
    fn card_missing_code_badge_fails() {
        let card = CARD.replace("item-github-link", "something-else");
        let document = Html::parse_document(&listing_html(&card));
        let err = extract_cards(&document).unwrap_err();
        assert!(err.contains("item-github-link"), "{err}");
    }

    #[test]
    fn detail_fields_are_extracted() {
        let document = Html::parse_document(DETAIL);
        let detail = extract_detail(&document).unwrap();
        assert_eq!(detail.title, "Deep Things Considered");
        assert_eq!(detail.date, "12 Mar 2024");
        assert_eq!(detail.authors, "Ada Lovelace, Alan Turing");
        assert_eq!(detail.abstract_text, "Deep things considered, at length.");
        assert_eq!(detail.arxiv_url, "https://arxiv.org/pdf/2403.00001v1.pdf");
        assert_eq!(
            detail.paper_task,
            vec!["Image Classification", "Object Detection"]
        );
        assert_eq!(
            detail.code,
            vec![
                "https://github.com/example/one",
                "https://github.com/example/two"
            ]
        );
    }

    #[test]
    fn detail_missing_authors_block_is_an_identifiable_error() {
        let html = DETAIL.replace(r#"class="authors""#, r#"class="nobody""#);
        let document = Html::parse_document(&html);
        let err = extract_detail(&document).unwrap_err();
        assert!(err.contains("missing expected element"), "{err}");
        assert!(err.contains("div.authors"), "{err}");
    }

    #[test]
    fn strip_abstract_is_a_prefix_of_the_full_abstract() {
        let listing = Html::parse_document(&listing_html(CARD));
        let card = extract_cards(&listing).unwrap().remove(0);
        let detail = extract_detail(&Html::parse_document(DETAIL)).unwrap();
        let truncated = card.strip_abstract.trim_end_matches('.');
        assert!(detail.abstract_text.starts_with(truncated));
    }
}
