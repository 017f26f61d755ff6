//! Built-in dental pathology profiles.

use super::model::{PathologyProfile, SymptomFact};

struct ProfileSeed {
    key: &'static str,
    label: &'static str,
    chief_complaint: &'static str,
    pain: &'static str,
    location: &'static str,
    duration: &'static str,
    appearance: &'static str,
    history: &'static str,
    extra: &'static str,
    synonyms: &'static [&'static str],
}

const SEEDS: &[ProfileSeed] = &[
    ProfileSeed {
        key: "periodontal_abscess",
        label: "Periodontal Abscess",
        chief_complaint: "Pain near a tooth, initially thought to be tooth pain.",
        pain: "Localized gum pain; tender on vestibular palpation and lateral percussion.",
        location: "Gingiva adjacent to affected tooth.",
        duration: "Started recently, with chronic food impaction and occasional pus discharge.",
        appearance: "Gum swelling with possible pus or unusual taste.",
        history: "Initially confused about source of pain; tooth non-sensitive; no night or pulsating pain.",
        extra: "Patient responds like a confused patient; reports discomfort mainly in gums rather than tooth.",
        synonyms: &["periodontal abscess", "gum abscess", "gingival abscess", "abscess"],
    },
    ProfileSeed {
        key: "dental_caries",
        label: "Simple Caries / No Pulpal Involvement",
        chief_complaint: "Tooth discomfort only when exposed to cold, sweet, sour, or brushing; stops immediately after stimulus.",
        pain: "Sharp, transient pain in response to stimuli; no spontaneous pain or night pain.",
        location: "Affected tooth (typically posterior tooth).",
        duration: "Episodes occur only during stimulus; pain stops immediately afterward.",
        appearance: "Small cavity or visible dark spot; tooth otherwise normal.",
        history: "No history of spontaneous or prolonged pain; tooth not sensitive to percussion or palpation.",
        extra: "Patient reports normal response to cold tests and palpation; pain never persists after stimulus.",
        synonyms: &["dental caries", "simple caries", "caries", "tooth decay"],
    },
    ProfileSeed {
        key: "pulpal_necrosis",
        label: "Pulp Necrosis (Post Acute Pulpitis)",
        chief_complaint: "Tooth previously had intense spontaneous pain, now completely numb.",
        pain: "No current pain; mild tenderness when biting or percussion; history of intense, spontaneous pain lasting 3-4 days.",
        location: "Affected tooth (usually a molar).",
        duration: "Intense pain lasted 3-4 days, now completely gone.",
        appearance: "Tooth appears normal; no swelling or fistula.",
        history: "Past acute pulpitis with severe pain; tooth no longer responds to cold.",
        extra: "Patient describes tooth as 'dead' or 'numb'; slight sensitivity on palpation, no night or pulsating pain.",
        synonyms: &["pulp necrosis", "pulpal necrosis", "necrotic pulp", "necrosis"],
    },
    ProfileSeed {
        key: "chronic_apical_periodontitis",
        label: "Chronic Apical Periodontitis",
        chief_complaint: "Dull pressure or discomfort on a tooth; occasional fluid discharge from a small gum bump.",
        pain: "Mild sensitivity to percussion or palpation; no spontaneous pain; no response to cold (non-vital tooth).",
        location: "Affected tooth (may have history of prior root canal treatment).",
        duration: "Symptoms may be chronic or intermittent; occasional fistula or gum bump.",
        appearance: "Gum may show small fistula/bump; tooth otherwise appears normal.",
        history: "Some teeth previously treated with root canal; no history of acute pain.",
        extra: "Patient reports slight pressure when biting; salty or unusual-tasting liquid may appear occasionally.",
        synonyms: &["apical periodontitis", "periapical lesion", "periodontitis"],
    },
    ProfileSeed {
        key: "acute_apical_periodontitis",
        label: "Acute Apical Periodontitis",
        chief_complaint: "Severe pain when biting or touching the tooth; tooth feels higher than usual.",
        pain: "Pain only on pressure/occlusion; severe on vertical percussion; no pain with cold or heat; no spontaneous or night pain.",
        location: "Affected tooth (typically posterior tooth).",
        duration: "Pain occurs only during mastication or pressure; recent onset.",
        appearance: "No visible swelling; tooth may appear normal.",
        history: "No prior spontaneous pain; patient reports sensation of tooth extrusion.",
        extra: "Patient describes sharp sting when biting; discomfort on lateral palpation is mild; responds normally to cold test.",
        synonyms: &["apical periodontitis", "periodontitis"],
    },
    ProfileSeed {
        key: "pericoronitis",
        label: "Pericoronitis",
        chief_complaint: "Continuous pain in the area of a partially erupted wisdom tooth; difficulty opening mouth.",
        pain: "Persistent, localized pain; worsens on chewing or swallowing; pain on palpation of inflamed gum; does not pulsate; not related to cold or heat; does not wake patient at night.",
        location: "Posterior mandibular or maxillary region (around wisdom tooth).",
        duration: "Continuous pain; intermittent relief with anti-inflammatories.",
        appearance: "Partially erupted wisdom tooth; inflamed, swollen gum; sometimes a visible gum bump.",
        history: "Patient may have intermittent flare-ups; pain triggered by local irritation rather than thermal stimuli.",
        extra: "Limited mouth opening (trismus); sometimes foul or salty taste due to discharge; pain may radiate toward the ear.",
        synonyms: &["pericoronal infection", "operculitis"],
    },
    ProfileSeed {
        key: "reversible_pulpitis",
        label: "Reversible Pulpitis",
        chief_complaint: "Tooth pain triggered by cold or sweet stimuli for a few days.",
        pain: "Sharp, transient pain with cold, sweet, or sour stimuli; stops immediately after stimulus removal; does not pulsate; no spontaneous or night pain; no sensitivity to percussion or palpation.",
        location: "Affected tooth (variable).",
        duration: "Few days.",
        appearance: "No visible swelling or discoloration.",
        history: "No prior episodes of spontaneous or prolonged pain.",
        extra: "Pain only occurs with external stimuli; adjacent teeth respond normally to cold.",
        synonyms: &["pulpitis", "pulp inflammation"],
    },
    ProfileSeed {
        key: "acute_total_pulpitis",
        label: "Acute Total Pulpitis",
        chief_complaint: "Severe, throbbing tooth pain that sometimes occurs spontaneously or is triggered by cold or heat.",
        pain: "Spontaneous, pulsating pain; intensified by thermal stimuli (cold/heat); pain lingers for minutes after stimulus; wakes patient at night; mild sensitivity to percussion; no swelling or pus.",
        location: "Affected tooth (variable).",
        duration: "Acute episodes lasting days; pain can linger for minutes after stimulus.",
        appearance: "No visible swelling or pus.",
        history: "Recent onset of severe toothache; no prior significant dental history mentioned.",
        extra: "Pain is severe, throbbing, and persistent with thermal stimuli; adjacent teeth respond normally to cold.",
        synonyms: &["irreversible pulpitis", "pulpitis", "pulp inflammation"],
    },
];

/// Returns the built-in profiles in declaration order.
pub fn builtin_profiles() -> Vec<PathologyProfile> {
    SEEDS.iter().map(ProfileSeed::to_profile).collect()
}

impl ProfileSeed {
    fn to_profile(&self) -> PathologyProfile {
        PathologyProfile {
            key: self.key.to_string(),
            label: self.label.to_string(),
            chief_complaint: self.chief_complaint.to_string(),
            symptoms: vec![
                SymptomFact::new("pain", self.pain),
                SymptomFact::new("location", self.location),
                SymptomFact::new("duration", self.duration),
                SymptomFact::new("appearance", self.appearance),
                SymptomFact::new("history", self.history),
                SymptomFact::new("extra", self.extra),
            ],
            diagnosis: self.label.to_string(),
            diagnosis_synonyms: self.synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }
}
