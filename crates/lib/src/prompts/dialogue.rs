//! # Dialogue Prompts
//!
//! Stage directives that steer the model through lead qualification, and the
//! fixed replies the dialogue engine sends without consulting the model.

use crate::dialogue::Field;

/// Marker the model appends when its reply asks for a phone number.
pub const CONTACT_REQUEST_MARKER: &str = "[[CONTACT_REQUEST]]";

pub const CONTACT_MARKER_INSTRUCTION: &str = "Если в своём ответе ты просишь клиента оставить \
номер телефона, добавь в самом конце ответа метку [[CONTACT_REQUEST]]. Клиент её не увидит.";

pub const GREETING_DIRECTIVE: &str =
    "Это начало разговора: коротко поздоровайся с клиентом.";

pub const NO_GREETING_DIRECTIVE: &str =
    "Вы уже поздоровались, не здоровайся повторно и продолжай разговор.";

pub const ASK_PAIN_DIRECTIVE: &str = "Задай клиенту открытый вопрос: какую задачу или проблему \
в бизнесе он хочет решить с помощью ИИ. Задай только этот вопрос.";

pub const REPROMPT_PAIN_DIRECTIVE: &str = "Клиент пока не описал свою задачу. Ответь на его \
вопрос и мягко попроси рассказать, какую проблему в бизнесе он хочет решить.";

pub const REQUEST_CONTACT_DIRECTIVE: &str = "Поблагодари за описание задачи, предложи бесплатную \
консультацию специалиста и попроси оставить номер телефона и удобное время для звонка.";

pub const COMPLETED_DIRECTIVE: &str = "Контакты клиента уже получены, специалист свяжется с ним. \
Отвечай на вопросы, опираясь на известные факты, и не предлагай консультацию повторно.";

/// Sent after a phone number has been captured.
pub const LEAD_ACKNOWLEDGMENT: &str = "Спасибо! Мы записали ваш номер. Наш специалист \
свяжется с вами в указанное время.";

/// Sent when a session is (re)started.
pub const WELCOME_MESSAGE: &str = "👋 Здравствуйте! Я ИИ-консультант агентства по внедрению \
искусственного интеллекта в бизнес. Расскажу о наших услугах и помогу подобрать решение. \
Чем могу помочь?";

/// Sent when a turn could not be completed.
pub const TURN_FAILURE_APOLOGY: &str =
    "Извините, сейчас не получается ответить. Пожалуйста, попробуйте ещё раз чуть позже.";

/// The directive asking for one missing qualifying field.
pub fn ask_for_field(field: Field) -> &'static str {
    match field {
        Field::Name => "Вежливо спроси, как зовут клиента. Задай только этот вопрос.",
        Field::Company => {
            "Вежливо спроси, как называется компания клиента. Задай только этот вопрос."
        }
        Field::Industry => {
            "Вежливо спроси, в какой сфере работает компания клиента. Задай только этот вопрос."
        }
        Field::Pain => ASK_PAIN_DIRECTIVE,
        Field::Phone | Field::PreferredDate => REQUEST_CONTACT_DIRECTIVE,
    }
}
