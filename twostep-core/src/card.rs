use crate::probs::RewardProbs;
use std::fmt;

/// Screen side a card is shown on. Left is choice index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Side::Left),
            1 => Some(Side::Right),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Identifies one of the six choice cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKey {
    Stage1(usize),
    Stage2 { context: usize, member: usize },
}

impl CardKey {
    pub const STAGE1: [CardKey; 2] = [CardKey::Stage1(0), CardKey::Stage1(1)];

    pub const ALL: [CardKey; 6] = [
        CardKey::Stage1(0),
        CardKey::Stage1(1),
        CardKey::Stage2 { context: 0, member: 0 },
        CardKey::Stage2 { context: 0, member: 1 },
        CardKey::Stage2 { context: 1, member: 0 },
        CardKey::Stage2 { context: 1, member: 1 },
    ];

    pub fn stage2(context: usize) -> [CardKey; 2] {
        [
            CardKey::Stage2 { context, member: 0 },
            CardKey::Stage2 { context, member: 1 },
        ]
    }

    /// Name written to the history: `"0"`/`"1"` for stage 1, `"2ij"` for stage 2.
    pub fn name(&self) -> String {
        match self {
            CardKey::Stage1(i) => format!("{i}"),
            CardKey::Stage2 { context, member } => format!("2{context}{member}"),
        }
    }

    /// Image file holding this card's artwork
    pub fn image_file(&self) -> String {
        match self {
            CardKey::Stage1(i) => format!("Choice1{i}.png"),
            CardKey::Stage2 { context, member } => format!("Choice2{context}{member}.png"),
        }
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceCard {
    pub key: CardKey,
    pub name: String,
    /// Width and height in pixels
    pub size: (f32, f32),
    /// Always 0 for stage-1 cards
    pub reward_prob: f64,
}

impl ChoiceCard {
    pub fn new(key: CardKey, size: (f32, f32), reward_prob: f64) -> Self {
        Self {
            key,
            name: key.name(),
            size,
            reward_prob,
        }
    }
}

/// The six cards of a session. Reward probabilities are replaced wholesale
/// through [`CardSet::with_reward_probs`].
#[derive(Debug, Clone, PartialEq)]
pub struct CardSet {
    stage1: [ChoiceCard; 2],
    stage2: [[ChoiceCard; 2]; 2],
}

impl CardSet {
    pub fn new<F>(probs: RewardProbs, mut size_of: F) -> Self
    where
        F: FnMut(CardKey) -> (f32, f32),
    {
        let stage1 = CardKey::STAGE1.map(|key| ChoiceCard::new(key, size_of(key), 0.0));
        let stage2 = [0, 1].map(|context| {
            [0, 1].map(|member| {
                let key = CardKey::Stage2 { context, member };
                ChoiceCard::new(key, size_of(key), probs.get(context, member))
            })
        });
        Self { stage1, stage2 }
    }

    /// All cards sized `size`
    pub fn uniform(probs: RewardProbs, size: (f32, f32)) -> Self {
        Self::new(probs, |_| size)
    }

    pub fn get(&self, key: CardKey) -> &ChoiceCard {
        match key {
            CardKey::Stage1(i) => &self.stage1[i],
            CardKey::Stage2 { context, member } => &self.stage2[context][member],
        }
    }

    pub fn reward_probs(&self) -> RewardProbs {
        RewardProbs::new(self.stage2.each_ref().map(|row| row.each_ref().map(|c| c.reward_prob)))
    }

    pub fn with_reward_probs(&self, probs: RewardProbs) -> Self {
        let mut next = self.clone();
        for (context, row) in next.stage2.iter_mut().enumerate() {
            for (member, card) in row.iter_mut().enumerate() {
                card.reward_prob = probs.get(context, member);
            }
        }
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChoiceCard> {
        self.stage1.iter().chain(self.stage2.iter().flatten())
    }
}
