//! Word lists used by the rule-based pipeline. All entries are lowercase.

/// Function words that break noun chunks.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "during", "each", "either", "etc",
    "every", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "out", "over", "own", "per", "same", "she", "should", "so",
    "some", "such", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "upon", "very", "via",
    "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "within", "without", "would", "you", "your", "yours",
];

/// Verbs common in CV bullet points. They end a chunk the same way stop words do.
pub const ACTION_VERBS: &[&str] = &[
    "achieved", "administered", "analyzed", "architected", "assisted", "automated", "built",
    "collaborated", "completed", "conducted", "coordinated", "created", "decreased", "defined",
    "delivered", "deployed", "designed", "developed", "directed", "drove", "enabled",
    "engineered", "established", "executed", "facilitated", "generated", "grew", "handled",
    "helped", "implemented", "improved", "increased", "initiated", "integrated", "launched",
    "led", "maintained", "managed", "mentored", "migrated", "monitored", "negotiated",
    "optimized", "organized", "oversaw", "owned", "participated", "performed", "planned",
    "prepared", "presented", "produced", "provided", "published", "reduced", "refactored",
    "researched", "resolved", "reviewed", "scaled", "secured", "served", "shipped",
    "spearheaded", "streamlined", "supervised", "supported", "taught", "tested", "trained",
    "transformed", "used", "utilized", "worked", "wrote",
];

/// Trailing words that mark a capitalized span as an organization.
pub const ORG_SUFFIXES: &[&str] = &[
    "agency", "ag", "associates", "bank", "co", "co.", "college", "company", "consulting",
    "corp", "corp.", "corporation", "foundation", "gmbh", "group", "hospital", "inc", "inc.",
    "institute", "labs", "llc", "llp", "ltd", "ltd.", "ministry", "partners", "plc", "school",
    "solutions", "systems", "technologies", "university",
];

/// Leading words that mark a capitalized span as an organization ("University of X").
pub const ORG_PREFIXES: &[&str] = &["bank", "college", "department", "institute", "ministry", "school", "university"];

/// Words inside a capitalized span that mark it as an event.
pub const EVENT_CUES: &[&str] = &[
    "award", "bootcamp", "championship", "conference", "congress", "cup", "expo", "festival",
    "forum", "hackathon", "meetup", "olympiad", "olympics", "summit", "symposium", "workshop",
];

/// Lowercase connectors allowed inside a capitalized span.
pub const SPAN_CONNECTORS: &[&str] = &["&", "and", "de", "for", "of", "the"];

/// Countries, states and large cities.
pub const GEOPOLITICAL: &[&str] = &[
    "amsterdam", "argentina", "athens", "atlanta", "austin", "australia", "austria", "bangalore",
    "barcelona", "beijing", "belgium", "berlin", "boston", "brazil", "california", "canada",
    "chicago", "china", "colorado", "copenhagen", "denmark", "dubai", "dublin", "egypt",
    "england", "finland", "florida", "france", "germany", "greece", "hamburg", "hong kong",
    "india", "indonesia", "ireland", "israel", "istanbul", "italy", "japan", "kenya", "lagos",
    "lisbon", "london", "los angeles", "madrid", "massachusetts", "melbourne", "mexico",
    "milan", "montreal", "mumbai", "munich", "netherlands", "new jersey", "new york",
    "new zealand", "nigeria", "norway", "ontario", "oslo", "paris", "poland", "portugal",
    "prague", "rome", "san francisco", "seattle", "seoul", "shanghai", "singapore",
    "south africa", "spain", "stockholm", "sweden", "switzerland", "sydney", "texas", "tokyo",
    "toronto", "turkey", "uk", "united kingdom", "united states", "usa", "vancouver", "vienna",
    "warsaw", "washington", "zurich",
];

/// Well-known tools, platforms and software products.
pub const PRODUCTS: &[&str] = &[
    "android", "angular", "ansible", "aws", "azure", "bigquery", "c++", "c#", "cassandra",
    "confluence", "django", "docker", "elasticsearch", "excel", "figma", "flask", "gcp", "git",
    "github", "gitlab", "golang", "graphql", "hadoop", "ios", "java", "javascript",
    "jenkins", "jira", "kafka", "kotlin", "kubernetes", "linux", "matlab", "mongodb", "mysql",
    "node.js", "nodejs", "numpy", "oracle", "pandas", "photoshop", "postgresql", "power bi",
    "powerpoint", "python", "pytorch", "react", "redis", "ruby", "rust", "salesforce", "sap",
    "scala", "scikit-learn", "snowflake", "spark", "sql", "swift", "tableau", "tensorflow",
    "terraform", "typescript", "unity", "vue", "windows",
];

/// Products that are also ordinary English words; only matched when capitalized.
pub const AMBIGUOUS_PRODUCTS: &[&str] = &[
    "excel", "oracle", "react", "spark", "swift", "unity", "windows",
];

/// Employers common enough to recognize without a suffix.
pub const ORGANIZATIONS: &[&str] = &[
    "accenture", "adobe", "airbnb", "amazon", "apple", "bosch", "cisco", "deloitte", "ericsson",
    "facebook", "goldman sachs", "google", "ibm", "intel", "kpmg", "linkedin", "mckinsey",
    "meta", "microsoft", "netflix", "nokia", "nvidia", "pwc", "samsung", "shopify", "siemens",
    "spotify", "stripe", "tesla", "twitter", "uber", "unilever",
];

/// Month names and abbreviations, for date spans.
pub const MONTHS: &[&str] = &[
    "jan", "january", "feb", "february", "mar", "march", "apr", "april", "may", "jun", "june",
    "jul", "july", "aug", "august", "sep", "sept", "september", "oct", "october", "nov",
    "november", "dec", "december",
];

pub fn contains(list: &[&str], word: &str) -> bool {
    list.contains(&word)
}
