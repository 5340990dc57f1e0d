use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use volo_core::format::truncate_text;
use volo_core::{
    classify_intent_rules, detect_locale, fallback_keywords, normalize_text, suggestions_for,
    ChatContext, ChatReply, ImageDescription, Intent, IntentAnalysis, Locale, Preferences,
    Recommendation, Review, ReviewDraft, ReviewQuality, Sentiment,
};
use volo_ml::{ChatMessage, CompletionRequest, LanguageModel, ModelError, Role};
use volo_observability::AppMetrics;

pub const DEFAULT_ASSISTANT_TIMEOUT: Duration = Duration::from_secs(15);

/// Turns of client history forwarded to the model.
pub const HISTORY_WINDOW: usize = 10;

const RECOMMEND_SYSTEM: &str =
    "أنت مساعد سفر ذكي ومتخصص في فنادق الجزائر. تقدم توصيات مخصصة وتجيب باللغة العربية.";
const SENTIMENT_SYSTEM: &str =
    "حلل المشاعر في النص العربي. أجب بكلمة واحدة فقط: إيجابي، سلبي، أو محايد.";
const OPTIMIZE_SYSTEM: &str =
    "حسن العبارة العربية للبحث عن الفنادق. استخرج الكلمات المفتاحية المهمة.";
const INTENT_SYSTEM: &str = "صنف نية الرسالة العربية إلى واحدة من هذه الفئات: \
    search, booking, info, help, complaint, review, general. أجب بكلمة واحدة فقط.";
const KEYWORDS_SYSTEM: &str =
    "استخرج الكلمات المفتاحية من النص العربي للبحث عن الفنادق. أجب بأسماء مفصولة بفواصل.";
const QUALITY_SYSTEM: &str =
    "أنت خبير في تحليل جودة مراجعات الفنادق. قدم تحليلاً موضوعياً ودقيقاً.";
const SUMMARY_SYSTEM: &str = "اكتب ملخص ذكي للمراجعات العربية لفندق. \
    ركز على النقاط الإيجابية والسلبية والمميزات الرئيسية.";
const DESCRIBE_IMAGE_PROMPT: &str =
    "صف هذه الصورة لغرفة فندق أو مطعم بالتفصيل. اذكر المرافق والديكور والأثاث.";

const RECOMMEND_FALLBACK: &str = "يُنصح بزيارة الجزائر العاصمة ووهران وقسنطينة. \
    استكشف المدن التاريخية والاستمتاع بالمأكولات المحلية.";
const DESCRIBE_IMAGE_FALLBACK: &str = "صورة لغرفة فندق مريحة مع ديكور عصري.";
const CHAT_FALLBACK: &str =
    "عذراً، حدث خطأ تقني. يرجى المحاولة مرة أخرى أو استخدام البحث اليدوي.";
const SUMMARY_FALLBACK: &str =
    "فندق مميز مع خدمات جيدة ومرافق متنوعة. يحظى بتقييمات إيجابية من النزلاء.";

const NOT_SPECIFIED: &str = "غير محدد";

pub const FALLBACK_REVIEW_QUALITY: ReviewQuality = ReviewQuality {
    accuracy: 85,
    quality: 7,
    usefulness: 6,
    appropriate: true,
};

/// Prompted operations over a [`LanguageModel`].
///
/// Each operation makes at most one model call, bounded by `timeout`. Any
/// failure (transport, status, empty reply, timeout) yields the operation's
/// static fallback, so callers never see a model error.
pub struct Assistant<M> {
    model: Arc<M>,
    timeout: Duration,
    metrics: Arc<AppMetrics>,
}

impl<M> Clone for Assistant<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            timeout: self.timeout,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<M: LanguageModel> Assistant<M> {
    pub fn new(model: Arc<M>, timeout: Duration, metrics: Arc<AppMetrics>) -> Self {
        Self {
            model,
            timeout,
            metrics,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub async fn recommend(&self, preferences: &Preferences) -> Recommendation {
        let request = CompletionRequest::new(
            vec![
                ChatMessage::system(RECOMMEND_SYSTEM),
                ChatMessage::user(recommendation_prompt(preferences)),
            ],
            1000,
            0.7,
        );

        match self.ask("recommend", request).await {
            Ok(recommendation) => Recommendation {
                success: true,
                recommendation,
                error: None,
            },
            Err(error) => Recommendation {
                success: false,
                recommendation: RECOMMEND_FALLBACK.to_string(),
                error: Some(error.to_string()),
            },
        }
    }

    /// Describes a room or restaurant photo for a listing.
    pub async fn describe_image(&self, image_url: &str) -> ImageDescription {
        let request = CompletionRequest::new(
            vec![ChatMessage::user_with_image(DESCRIBE_IMAGE_PROMPT, image_url)],
            200,
            0.6,
        );

        let (success, description) = match self.ask("describe_image", request).await {
            Ok(description) => (true, description.trim().to_string()),
            Err(_) => (false, DESCRIBE_IMAGE_FALLBACK.to_string()),
        };
        ImageDescription {
            success,
            image_url: image_url.to_string(),
            description,
        }
    }

    pub async fn analyze_sentiment(&self, text: &str) -> Sentiment {
        let request = CompletionRequest::new(
            vec![ChatMessage::system(SENTIMENT_SYSTEM), ChatMessage::user(text)],
            100,
            0.3,
        );

        match self.ask("analyze_sentiment", request).await {
            Ok(reply) => parse_sentiment(&reply),
            Err(_) => Sentiment::Neutral,
        }
    }

    pub async fn optimize_search_query(&self, input: &str) -> String {
        let request = CompletionRequest::new(
            vec![
                ChatMessage::system(OPTIMIZE_SYSTEM),
                ChatMessage::user(format!("حسن هذا البحث: \"{input}\"")),
            ],
            200,
            0.5,
        );

        self.ask("optimize_search_query", request)
            .await
            .map(|reply| reply.trim().to_string())
            .unwrap_or_else(|_| input.to_string())
    }

    pub async fn analyze_intent(&self, message: &str) -> IntentAnalysis {
        let request = CompletionRequest::new(
            vec![ChatMessage::system(INTENT_SYSTEM), ChatMessage::user(message)],
            10,
            0.3,
        );

        match self.ask("analyze_intent", request).await {
            Ok(reply) => IntentAnalysis {
                intent: Intent::parse(&reply).unwrap_or(Intent::General),
                confidence: 0.9,
                keywords: self.extract_keywords(message).await,
            },
            Err(_) => IntentAnalysis {
                intent: classify_intent_rules(&normalize_text(message)),
                confidence: 0.5,
                keywords: fallback_keywords(message),
            },
        }
    }

    pub async fn extract_keywords(&self, text: &str) -> Vec<String> {
        let request = CompletionRequest::new(
            vec![ChatMessage::system(KEYWORDS_SYSTEM), ChatMessage::user(text)],
            100,
            0.3,
        );

        match self.ask("extract_keywords", request).await {
            Ok(reply) => split_keywords(&reply),
            Err(_) => fallback_keywords(text),
        }
    }

    pub async fn chat(&self, message: &str, context: &ChatContext) -> ChatReply {
        let hint = Locale::from_optional_str(context.locale.as_deref());
        let locale = detect_locale(Some(hint), message);

        let mut messages = vec![ChatMessage::system(chat_system_prompt(context))];
        let skip = context
            .conversation_history
            .len()
            .saturating_sub(HISTORY_WINDOW);
        messages.extend(
            context
                .conversation_history
                .iter()
                .skip(skip)
                .map(|turn| ChatMessage::new(Role::parse(&turn.role), turn.content.as_str())),
        );
        messages.push(ChatMessage::user(message));

        let Ok(response) = self
            .ask("chat", CompletionRequest::new(messages, 800, 0.7))
            .await
        else {
            return ChatReply {
                success: false,
                response: CHAT_FALLBACK.to_string(),
                intent: IntentAnalysis {
                    intent: Intent::Error,
                    confidence: 1.0,
                    keywords: Vec::new(),
                },
                suggestions: suggestions_for(Intent::Error),
                locale,
                rtl: locale.is_rtl(),
            };
        };

        let intent = self.analyze_intent(message).await;
        let suggestions = suggestions_for(intent.intent);
        ChatReply {
            success: true,
            response,
            intent,
            suggestions,
            locale,
            rtl: locale.is_rtl(),
        }
    }

    pub async fn analyze_review_quality(&self, draft: &ReviewDraft) -> ReviewQuality {
        let request = CompletionRequest::new(
            vec![
                ChatMessage::system(QUALITY_SYSTEM),
                ChatMessage::user(review_quality_prompt(draft)),
            ],
            300,
            0.4,
        );

        self.ask("analyze_review_quality", request)
            .await
            .ok()
            .and_then(|reply| parse_review_quality(&reply))
            .unwrap_or(FALLBACK_REVIEW_QUALITY)
    }

    pub async fn summarize_reviews(&self, reviews: &[Review]) -> String {
        if reviews.is_empty() {
            return SUMMARY_FALLBACK.to_string();
        }

        let listing = reviews
            .iter()
            .enumerate()
            .map(|(idx, review)| {
                format!(
                    "{}. التقييم: {}/5 - {}",
                    idx + 1,
                    review.rating.value(),
                    truncate_text(&review.comment, 200)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let request = CompletionRequest::new(
            vec![
                ChatMessage::system(SUMMARY_SYSTEM),
                ChatMessage::user(format!("مراجعات الفندق:\n{listing}")),
            ],
            400,
            0.6,
        );

        self.ask("summarize_reviews", request)
            .await
            .unwrap_or_else(|_| SUMMARY_FALLBACK.to_string())
    }

    /// One bounded model call. Errors are already counted and logged; callers
    /// only pick their fallback.
    async fn ask(
        &self,
        operation: &'static str,
        request: CompletionRequest,
    ) -> Result<String, ModelError> {
        self.metrics.inc_assistant_call(operation);

        let outcome = match tokio::time::timeout(self.timeout, self.model.complete(request)).await
        {
            Ok(Ok(text)) if text.trim().is_empty() => Err(ModelError::EmptyCompletion),
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(self.timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(text) => {
                debug!(operation, model = self.model.model_name(), "assistant call succeeded");
                Ok(text)
            }
            Err(error) => {
                self.record_fallback(operation, &error);
                Err(error)
            }
        }
    }

    fn record_fallback(&self, operation: &'static str, error: &ModelError) {
        self.metrics.inc_assistant_fallback(operation);
        match error {
            ModelError::Unavailable => debug!(operation, "assistant offline, using fallback"),
            _ => warn!(operation, error = %error, "assistant call failed, using fallback"),
        }
    }
}

fn recommendation_prompt(preferences: &Preferences) -> String {
    let joined = |items: &[String]| {
        if items.is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            items.join(", ")
        }
    };

    let budget = preferences
        .budget
        .map(|budget| budget.to_string())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());
    let destination = preferences
        .destination
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(NOT_SPECIFIED);
    let rating = preferences
        .min_rating
        .map(|rating| rating.to_string())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());

    format!(
        "أنت مساعد ذكي متخصص في فنادق الجزائر. قدم توصيات مخصصة بناءً على تفضيلات المستخدم:\n\n\
         التفضيلات:\n\
         - الميزانية: {budget} DZD\n\
         - الوجهة: {destination}\n\
         - التواريخ: {dates}\n\
         - الاهتمامات: {interests}\n\
         - التقييم المطلوب: {rating} نجوم\n\
         - المرافق المفضلة: {amenities}\n\n\
         قدم رداً باللغة العربية يحتوي على:\n\
         1. توصيات مناسبة للفنادق (3-5 فنادق)\n\
         2. شرح موجز لكل توصية\n\
         3. نصائح مفيدة للسفر\n\
         4. بدائل للخيارات المحدودة",
        dates = joined(&preferences.travel_dates),
        interests = joined(&preferences.interests),
        amenities = joined(&preferences.preferred_amenities),
    )
}

fn chat_system_prompt(context: &ChatContext) -> String {
    let mut prompt = String::from(
        "أنت مساعد ذكي لمنصة فولو لحجز الفنادق في الجزائر. مساعدتك تشمل:\n\
         1. البحث عن الفنادق المناسبة\n\
         2. تقديم معلومات حول الفنادق والخدمات\n\
         3. الإجابة على أسئلة الحجز\n\
         4. تقديم نصائح السفر\n\
         5. المساعدة في اختيار المرافق والخدمات\n\n\
         استخدم اللغة العربية دائماً وتحدث بأسلوب ودود ومهني.",
    );

    if let Some(hotel) = context
        .current_hotel
        .as_deref()
        .filter(|name| !name.trim().is_empty())
    {
        prompt.push_str(&format!("\n\nالفندق الحالي المشاهد: {hotel}"));
    }
    if let Some(preferences) = &context.user_preferences {
        let rendered = serde_json::to_string_pretty(preferences).unwrap_or_default();
        prompt.push_str(&format!("\nتفضيلات المستخدم: {rendered}"));
    }
    prompt
}

fn review_quality_prompt(draft: &ReviewDraft) -> String {
    format!(
        "حلل جودة هذه المراجعة لفندق:\n\n\
         التقييم: {rating}/5 نجوم\n\
         العنوان: {title}\n\
         التعليق: {comment}\n\n\
         قدم تحليل يشمل:\n\
         1. مدى تطابق التقييم مع المحتوى (accuracy: 0-100)\n\
         2. جودة المحتوى (quality: 1-10)\n\
         3. مدى فائدة المراجعة للآخرين (usefulness: 1-10)\n\
         4. إذا كانت مناسبة للنشر (appropriate: true/false)\n\n\
         أجب بصيغة JSON فقط.",
        rating = draft.rating,
        title = draft.title.as_deref().unwrap_or(NOT_SPECIFIED),
        comment = draft.comment,
    )
}

const NEGATED_POSITIVE: &[&str] = &[
    "غير إيجابي",
    "غير ايجابي",
    "ليس إيجابي",
    "ليس ايجابي",
    "ليست إيجابية",
    "not positive",
];
const NEGATED_NEGATIVE: &[&str] = &[
    "غير سلبي",
    "ليس سلبي",
    "ليست سلبية",
    "not negative",
];

/// Maps a model label to a [`Sentiment`]. Negated labels are matched before
/// plain ones: "not positive" reads as negative, "not negative" as neutral.
pub fn parse_sentiment(reply: &str) -> Sentiment {
    let lower = reply.trim().to_lowercase();
    if NEGATED_POSITIVE.iter().any(|label| lower.contains(label)) {
        return Sentiment::Negative;
    }
    if NEGATED_NEGATIVE.iter().any(|label| lower.contains(label)) {
        return Sentiment::Neutral;
    }

    if lower.contains("سلبي") || lower.contains("negative") {
        Sentiment::Negative
    } else if lower.contains("إيجابي") || lower.contains("ايجابي") || lower.contains("positive")
    {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

pub fn split_keywords(reply: &str) -> Vec<String> {
    reply
        .split([',', '،', '\n'])
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Reads the first JSON object in `reply`; models often wrap it in prose or a
/// code fence.
pub fn parse_review_quality(reply: &str) -> Option<ReviewQuality> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }

    let parsed: ReviewQuality = serde_json::from_str(&reply[start..=end]).ok()?;
    Some(ReviewQuality {
        accuracy: parsed.accuracy.min(100),
        quality: parsed.quality.clamp(1, 10),
        usefulness: parsed.usefulness.clamp(1, 10),
        appropriate: parsed.appropriate,
    })
}
