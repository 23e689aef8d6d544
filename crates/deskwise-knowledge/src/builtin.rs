//! Built-in knowledge set, used when no source file is configured.
//!
//! Mirrors the curated assistant content: greetings, navigation help,
//! KPI/report/document workflows, and the admin-only operations.

use deskwise_core::types::{KnowledgeEntry, Role};

fn entry(
    id: &str,
    category: &str,
    patterns: &[&str],
    answer: &str,
    roles: &[Role],
) -> KnowledgeEntry {
    KnowledgeEntry {
        id: id.to_string(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        canonical_question: patterns[0].to_string(),
        answer: answer.to_string(),
        category: category.to_string(),
        role_scope: roles.to_vec(),
        embedding: None,
    }
}

const BOTH: &[Role] = &[Role::Admin, Role::Enterprise];
const ADMIN: &[Role] = &[Role::Admin];

/// The default curated entry set.
pub fn default_entries() -> Vec<KnowledgeEntry> {
    vec![
        entry(
            "general-bonjour",
            "general",
            &["bonjour", "salut", "hello", "bonsoir"],
            "Bonjour ! Je suis l'assistant Deskwise. Posez-moi une question sur \
             vos indicateurs, vos documents ou vos démarches.",
            BOTH,
        ),
        entry(
            "general-merci",
            "general",
            &["merci", "merci beaucoup", "thanks"],
            "Avec plaisir ! N'hésitez pas si vous avez d'autres questions.",
            BOTH,
        ),
        entry(
            "general-aide",
            "general",
            &[
                "que peux-tu faire ?",
                "aide",
                "quelles sont tes fonctionnalités ?",
            ],
            "Je réponds aux questions sur les indicateurs (KPI), les documents, \
             les rapports et les démarches internes. Posez votre question en \
             langage naturel.",
            BOTH,
        ),
        entry(
            "kpi-ajouter",
            "kpi",
            &[
                "comment ajouter un kpi ?",
                "créer un indicateur",
                "ajouter un indicateur de performance",
            ],
            "Pour ajouter un KPI : menu « Indicateurs » puis « Nouveau KPI ». \
             Renseignez le nom, l'unité et la périodicité, puis validez.",
            BOTH,
        ),
        entry(
            "kpi-saisie",
            "kpi",
            &[
                "comment saisir les valeurs d'un kpi ?",
                "mettre à jour un indicateur",
                "saisir une valeur mensuelle",
            ],
            "Ouvrez l'indicateur concerné puis « Saisir une valeur ». Les \
             valeurs sont historisées par période et modifiables jusqu'à \
             validation.",
            BOTH,
        ),
        entry(
            "rapport-pdf",
            "rapports",
            &[
                "générer un rapport pdf",
                "exporter un rapport",
                "comment créer un rapport ?",
            ],
            "Dans « Rapports », choisissez la période et le modèle, puis \
             « Générer ». Le document est disponible en PDF ou Excel dans \
             votre espace téléchargements.",
            BOTH,
        ),
        entry(
            "documents-deposer",
            "documents",
            &[
                "comment déposer un document ?",
                "ajouter un fichier",
                "téléverser un document",
            ],
            "Rendez-vous dans « Documents » puis « Déposer ». Les formats PDF, \
             Word et Excel sont acceptés jusqu'à 20 Mo.",
            BOTH,
        ),
        entry(
            "documents-recherche",
            "documents",
            &[
                "comment retrouver un document ?",
                "rechercher un fichier",
                "où sont mes documents ?",
            ],
            "La barre de recherche de l'onglet « Documents » interroge le titre \
             et le contenu extrait des fichiers déposés.",
            BOTH,
        ),
        entry(
            "workflow-suivi",
            "workflows",
            &[
                "où en est ma démarche ?",
                "suivre un workflow",
                "statut de ma demande",
            ],
            "L'onglet « Démarches » liste vos demandes en cours avec leur \
             statut. Cliquez sur une demande pour voir l'étape actuelle et le \
             prochain intervenant.",
            BOTH,
        ),
        entry(
            "support-contact",
            "support",
            &[
                "contacter le support",
                "j'ai un problème",
                "comment obtenir de l'aide ?",
            ],
            "Le support est joignable via l'onglet « Assistance » ou par \
             courriel à support@deskwise.example. Décrivez votre problème et \
             joignez une capture d'écran si possible.",
            BOTH,
        ),
        entry(
            "admin-entreprise-creer",
            "administration",
            &[
                "comment créer une entreprise ?",
                "ajouter une entreprise",
                "enregistrer une nouvelle entreprise",
            ],
            "Administration > « Entreprises » > « Nouvelle entreprise ». \
             Renseignez la raison sociale et le SIRET ; le compte référent est \
             invité automatiquement.",
            ADMIN,
        ),
        entry(
            "admin-utilisateurs",
            "administration",
            &[
                "gérer les utilisateurs",
                "ajouter un utilisateur",
                "désactiver un compte",
            ],
            "Administration > « Utilisateurs ». Vous pouvez inviter, suspendre \
             ou réaffecter un compte à une autre entreprise.",
            ADMIN,
        ),
        entry(
            "admin-reload",
            "administration",
            &[
                "recharger la base de connaissances",
                "mettre à jour les réponses de l'assistant",
            ],
            "La base de connaissances se recharge depuis l'écran \
             Administration > « Assistant », ou via l'API de rechargement. \
             L'ancienne base reste servie si la nouvelle est invalide.",
            ADMIN,
        ),
        entry(
            "stats-globales",
            "statistiques",
            &[
                "statistiques de la plateforme",
                "combien d'entreprises sont inscrites ?",
                "chiffres globaux",
            ],
            "Les agrégats (entreprises actives, KPI suivis, documents déposés) \
             sont sur le tableau de bord Administration, mis à jour chaque nuit.",
            ADMIN,
        ),
    ]
}
